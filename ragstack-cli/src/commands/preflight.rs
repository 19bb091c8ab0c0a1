//! Environment checks run before any orchestration

use std::path::Path;
use std::time::Duration;

use kube::Client;
use ragstack_models::Component;
use ragstack_orchestrations::backend::ToolCommand;
use ragstack_orchestrations::error::PreconditionError;
use ragstack_orchestrations::k8s_client::{get_k8s_client, ClusterOps, KubeCluster};
use tracing::info;

use crate::config::Config;

const TOOL_CHECK_TIMEOUT: Duration = Duration::from_secs(15);

/// An external tool some component kinds need
struct RequiredTool<'a> {
    name: &'static str,
    program: &'a Path,
    version_args: &'static [&'static str],
    hint: &'static str,
}

fn required_tools<'a>(config: &'a Config, components: &[&Component]) -> Vec<RequiredTool<'a>> {
    let mut tools = Vec::new();
    if components.iter().any(|c| c.is_chart()) {
        tools.push(RequiredTool {
            name: "helm",
            program: &config.helm_bin,
            version_args: &["version", "--short"],
            hint: "install Helm 3 or set HELM_BIN",
        });
    }
    if components.iter().any(|c| !c.is_chart()) {
        tools.push(RequiredTool {
            name: "kubectl",
            program: &config.kubectl_bin,
            version_args: &["version", "--client"],
            hint: "install kubectl or set KUBECTL_BIN",
        });
    }
    tools
}

/// Verify the tools for `components` run and the cluster answers.
///
/// Returns a connected client.
pub async fn run(config: &Config, components: &[&Component]) -> Result<Client, PreconditionError> {
    for tool in required_tools(config, components) {
        let args: Vec<String> = tool.version_args.iter().map(|a| a.to_string()).collect();
        let version = ToolCommand::new(tool.program)
            .run(&args, None, TOOL_CHECK_TIMEOUT)
            .await
            .map_err(|e| PreconditionError::ToolMissing {
                tool: format!("{} ({})", tool.name, tool.program.display()),
                hint: format!("{}; {}", tool.hint, e),
            })?;
        info!(
            tool = tool.name,
            version = %version.lines().next().unwrap_or("").trim(),
            "Tool available"
        );
    }

    let client = get_k8s_client()
        .await
        .map_err(|e| PreconditionError::ClusterUnreachable(format!("{:#}", e)))?;
    KubeCluster::new(client.clone())
        .check_connectivity()
        .await
        .map_err(|e| PreconditionError::ClusterUnreachable(e.to_string()))?;
    info!("Cluster reachable");

    Ok(client)
}
