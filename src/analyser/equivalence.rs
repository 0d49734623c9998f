use petgraph::unionfind::UnionFind;

use crate::model::Model;

/// Variables joined by connections, numbered in document order.
///
/// Every variable of the model gets a flat index (components in order, then
/// variables in order). Sets are numbered by the flat index of their first
/// member, so set 0 contains the first variable of the first component.
#[derive(Debug)]
pub struct EquivalenceSets {
    offsets: Vec<usize>,
    locations: Vec<(usize, usize)>,
    set_of: Vec<usize>,
    members: Vec<Vec<usize>>,
}

impl EquivalenceSets {
    pub fn new(model: &Model) -> Self {
        let mut offsets = Vec::with_capacity(model.components.len());
        let mut locations = Vec::new();
        for (ci, component) in model.components.iter().enumerate() {
            offsets.push(locations.len());
            locations.extend((0..component.variables.len()).map(|vi| (ci, vi)));
        }

        let mut sets = UnionFind::<usize>::new(locations.len());
        for connection in &model.connections {
            let (Some(c1), Some(c2)) = (
                model.component_index(&connection.component_1),
                model.component_index(&connection.component_2),
            ) else {
                continue;
            };
            for (v1, v2) in &connection.variables {
                let (Some(v1), Some(v2)) = (
                    model.components[c1].variable_index(v1),
                    model.components[c2].variable_index(v2),
                ) else {
                    continue;
                };
                sets.union(offsets[c1] + v1, offsets[c2] + v2);
            }
        }

        // number sets by their first member so set order follows the document
        let mut set_of = vec![usize::MAX; locations.len()];
        let mut members: Vec<Vec<usize>> = Vec::new();
        let mut root_to_set = vec![usize::MAX; locations.len()];
        for i in 0..locations.len() {
            let root = sets.find_mut(i);
            if root_to_set[root] == usize::MAX {
                root_to_set[root] = members.len();
                members.push(Vec::new());
            }
            set_of[i] = root_to_set[root];
            members[set_of[i]].push(i);
        }
        Self {
            offsets,
            locations,
            set_of,
            members,
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Set containing variable `variable` of component `component`.
    pub fn set_of(&self, component: usize, variable: usize) -> usize {
        self.set_of[self.offsets[component] + variable]
    }

    /// Members of a set as `(component, variable)` indices, in document order.
    pub fn members(&self, set: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.members[set].iter().map(|&i| self.locations[i])
    }
}

#[cfg(test)]
mod tests {
    use super::EquivalenceSets;
    use crate::model::{Component, Connection, Model, Variable};

    fn component(name: &str, variables: &[&str]) -> Component {
        let mut c = Component::new(name);
        c.variables = variables.iter().map(|v| Variable::new(v, "second")).collect();
        c
    }

    fn connect(c1: &str, c2: &str, pairs: &[(&str, &str)]) -> Connection {
        Connection {
            component_1: c1.to_string(),
            component_2: c2.to_string(),
            variables: pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
        }
    }

    #[test]
    fn sets_follow_document_order() {
        let mut model = Model::new("m");
        model.components.push(component("main", &["t", "V"]));
        model.components.push(component("pump", &["V", "t", "i"]));
        model.components.push(component("env", &["t"]));
        model.connections.push(connect("pump", "main", &[("t", "t"), ("V", "V")]));
        model.connections.push(connect("env", "pump", &[("t", "t")]));

        let sets = EquivalenceSets::new(&model);
        assert_eq!(sets.len(), 3);
        let t = sets.set_of(0, 0);
        assert_eq!(t, 0);
        assert_eq!(sets.set_of(1, 1), t);
        assert_eq!(sets.set_of(2, 0), t);
        assert_eq!(sets.members(t).collect::<Vec<_>>(), vec![(0, 0), (1, 1), (2, 0)]);
        assert_eq!(sets.set_of(1, 0), 1);
        assert_eq!(sets.set_of(1, 2), 2);
    }

    #[test]
    fn dangling_connections_are_ignored() {
        let mut model = Model::new("m");
        model.components.push(component("main", &["t"]));
        model.connections.push(connect("main", "missing", &[("t", "t")]));
        let sets = EquivalenceSets::new(&model);
        assert_eq!(sets.len(), 1);
        assert!(!sets.is_empty());
    }
}
