//! Component registry: the ordered, dependency-annotated stack definition
//!
//! A registry is validated once when it is built. Every accessor afterwards
//! hands out components in dependency order (a component always follows all of
//! its `dependsOn` entries; ties keep declaration order).

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use ragstack_models::Component;
use serde::Deserialize;

use crate::error::ConfigurationError;
use crate::values;

/// Stack shipped with the binary
const BUILTIN_STACK: &str = include_str!("../stack/stack.yaml");

pub const DEFAULT_NAMESPACE: &str = "ragstack";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistryFile {
    #[serde(default)]
    namespace: Option<String>,
    components: Vec<Component>,
}

/// Which components an operation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every required component, plus optional ones when asked
    Default { include_optional: bool },
    /// Every component in the registry
    All,
    /// Exactly the named components
    Only(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    namespace: String,
    /// Components in dependency order
    ordered: Vec<Component>,
    index: HashMap<String, usize>,
}

impl ComponentRegistry {
    /// Validate components and compute their dependency order.
    ///
    /// Components without a namespace inherit `namespace`.
    pub fn new(
        namespace: impl Into<String>,
        components: Vec<Component>,
    ) -> Result<Self, ConfigurationError> {
        let namespace = namespace.into();
        if components.is_empty() {
            return Err(ConfigurationError::Empty);
        }

        let mut components = components;
        let mut declared: HashMap<String, usize> = HashMap::new();
        for (i, component) in components.iter_mut().enumerate() {
            if component.namespace.is_empty() {
                component.namespace = namespace.clone();
            }
            if declared.insert(component.name.clone(), i).is_some() {
                return Err(ConfigurationError::DuplicateComponent(component.name.clone()));
            }
        }

        for component in &components {
            for dependency in &component.depends_on {
                if !declared.contains_key(dependency) {
                    return Err(ConfigurationError::UndefinedDependency {
                        component: component.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
            values::validate(component)?;
        }

        let order = topological_order(&components, &declared)?;
        let mut slots: Vec<Option<Component>> = components.into_iter().map(Some).collect();
        let ordered: Vec<Component> = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect();
        let index = ordered
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();

        Ok(Self {
            namespace,
            ordered,
            index,
        })
    }

    /// Parse a registry document. `namespace` overrides the document's own.
    pub fn from_yaml(yaml: &str, namespace: Option<&str>) -> Result<Self, ConfigurationError> {
        let file: RegistryFile =
            serde_yaml::from_str(yaml).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        let namespace = namespace
            .map(str::to_string)
            .or(file.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        Self::new(namespace, file.components)
    }

    /// Read a registry document from disk
    pub fn from_file(path: &Path, namespace: Option<&str>) -> Result<Self, ConfigurationError> {
        let yaml = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&yaml, namespace)
    }

    /// The shipped LocalAI / Qdrant / AnythingLLM / RAG-Anything / ColQwen2 stack
    pub fn builtin(namespace: Option<&str>) -> Result<Self, ConfigurationError> {
        Self::from_yaml(BUILTIN_STACK, namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|&i| &self.ordered[i])
    }

    /// All components in dependency order
    pub fn in_dependency_order(&self) -> &[Component] {
        &self.ordered
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().map(|c| c.name.as_str())
    }

    /// Resolve a selection to components, in dependency order
    pub fn select(&self, selection: &Selection) -> Result<Vec<&Component>, ConfigurationError> {
        match selection {
            Selection::All => Ok(self.ordered.iter().collect()),
            Selection::Default { include_optional } => Ok(self
                .ordered
                .iter()
                .filter(|c| *include_optional || !c.optional)
                .collect()),
            Selection::Only(names) => {
                let mut wanted = BTreeSet::new();
                for name in names {
                    let i = self
                        .index
                        .get(name)
                        .ok_or_else(|| ConfigurationError::UnknownComponent(name.clone()))?;
                    wanted.insert(*i);
                }
                Ok(wanted.into_iter().map(|i| &self.ordered[i]).collect())
            }
        }
    }
}

/// Kahn's algorithm, always taking the earliest-declared ready component
fn topological_order(
    components: &[Component],
    declared: &HashMap<String, usize>,
) -> Result<Vec<usize>, ConfigurationError> {
    let mut remaining_deps: Vec<usize> = vec![0; components.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); components.len()];

    for (i, component) in components.iter().enumerate() {
        let unique: BTreeSet<usize> = component.depends_on.iter().map(|d| declared[d]).collect();
        remaining_deps[i] = unique.len();
        for dep in unique {
            dependents[dep].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..components.len())
        .filter(|&i| remaining_deps[i] == 0)
        .collect();
    let mut order = Vec::with_capacity(components.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &dependent in &dependents[next] {
            remaining_deps[dependent] -= 1;
            if remaining_deps[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() == components.len() {
        Ok(order)
    } else {
        Err(ConfigurationError::Cycle(find_cycle(components, declared, &remaining_deps)))
    }
}

/// Walk dependencies from a blocked component until a name repeats
fn find_cycle(
    components: &[Component],
    declared: &HashMap<String, usize>,
    remaining_deps: &[usize],
) -> Vec<String> {
    let Some(start) = remaining_deps.iter().position(|&n| n > 0) else {
        return Vec::new();
    };

    let mut path: Vec<usize> = vec![start];
    let mut current = start;
    loop {
        let next = components[current]
            .depends_on
            .iter()
            .map(|d| declared[d])
            .find(|&d| remaining_deps[d] > 0);
        let Some(next) = next else {
            break;
        };
        if let Some(pos) = path.iter().position(|&p| p == next) {
            let mut cycle: Vec<String> = path[pos..]
                .iter()
                .map(|&i| components[i].name.clone())
                .collect();
            cycle.push(components[next].name.clone());
            return cycle;
        }
        path.push(next);
        current = next;
    }

    path.iter().map(|&i| components[i].name.clone()).collect()
}
