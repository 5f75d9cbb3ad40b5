//! DataContract - user-assembled tree of collections under semantic labels
//!
//! Pure composition: the only rule is that labels are unique within a group.

use std::fmt::Write as _;

use crate::{ContractError, DataStream, DataStreamCollection};

/// Node of the contract tree
#[derive(Debug)]
pub enum ContractNode {
    Group(ContractGroup),
    Collection(DataStreamCollection),
}

impl ContractNode {
    pub fn as_group(&self) -> Option<&ContractGroup> {
        match self {
            ContractNode::Group(g) => Some(g),
            ContractNode::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&DataStreamCollection> {
        match self {
            ContractNode::Collection(c) => Some(c),
            ContractNode::Group(_) => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut DataStreamCollection> {
        match self {
            ContractNode::Collection(c) => Some(c),
            ContractNode::Group(_) => None,
        }
    }
}

impl From<ContractGroup> for ContractNode {
    fn from(group: ContractGroup) -> Self {
        ContractNode::Group(group)
    }
}

impl From<DataStreamCollection> for ContractNode {
    fn from(collection: DataStreamCollection) -> Self {
        ContractNode::Collection(collection)
    }
}

/// Ordered label -> node mapping
#[derive(Debug, Default)]
pub struct ContractGroup {
    label: String,
    children: Vec<(String, ContractNode)>,
}

impl ContractGroup {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Add a child node under `label`
    ///
    /// # Errors
    /// `DuplicateStream` if the label is taken.
    pub fn try_insert(
        &mut self,
        label: impl Into<String>,
        node: impl Into<ContractNode>,
    ) -> Result<(), ContractError> {
        let label = label.into();
        if self.get(&label).is_some() {
            return Err(ContractError::duplicate(&self.label, label));
        }
        self.children.push((label, node.into()));
        Ok(())
    }

    /// Builder form of [`ContractGroup::try_insert`]
    pub fn with(
        mut self,
        label: impl Into<String>,
        node: impl Into<ContractNode>,
    ) -> Result<Self, ContractError> {
        self.try_insert(label, node)?;
        Ok(self)
    }

    pub fn get(&self, label: &str) -> Option<&ContractNode> {
        self.children
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, n)| n)
    }

    pub fn get_mut(&mut self, label: &str) -> Option<&mut ContractNode> {
        self.children
            .iter_mut()
            .find(|(l, _)| l == label)
            .map(|(_, n)| n)
    }

    /// Child group by label
    pub fn group(&self, label: &str) -> Result<&ContractGroup, ContractError> {
        self.get(label)
            .and_then(ContractNode::as_group)
            .ok_or_else(|| ContractError::not_found(&self.label, label))
    }

    /// Child collection by label
    pub fn collection(&self, label: &str) -> Result<&DataStreamCollection, ContractError> {
        self.get(label)
            .and_then(ContractNode::as_collection)
            .ok_or_else(|| ContractError::not_found(&self.label, label))
    }

    pub fn collection_mut(
        &mut self,
        label: &str,
    ) -> Result<&mut DataStreamCollection, ContractError> {
        let container = self.label.clone();
        self.get_mut(label)
            .and_then(ContractNode::as_collection_mut)
            .ok_or_else(|| ContractError::not_found(container, label))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(l, _)| l.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ContractNode)> {
        self.children.iter().map(|(l, n)| (l.as_str(), n))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_streams<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a DataStream)>) {
        for (label, node) in &self.children {
            let path = join_path(prefix, label);
            match node {
                ContractNode::Group(g) => g.collect_streams(&path, out),
                ContractNode::Collection(c) => {
                    for stream in c {
                        out.push((join_path(&path, stream.name()), stream));
                    }
                }
            }
        }
    }

    fn collect_streams_mut<'a>(
        &'a mut self,
        prefix: &str,
        out: &mut Vec<(String, &'a mut DataStream)>,
    ) {
        for (label, node) in &mut self.children {
            let path = join_path(prefix, label);
            match node {
                ContractNode::Group(g) => g.collect_streams_mut(&path, out),
                ContractNode::Collection(c) => {
                    for stream in c.iter_mut() {
                        out.push((join_path(&path, stream.name()), stream));
                    }
                }
            }
        }
    }

    fn render(&self, depth: usize, out: &mut String) {
        for (i, (label, node)) in self.children.iter().enumerate() {
            let last = i + 1 == self.children.len();
            let indent = "    ".repeat(depth);
            let branch = if last { "└── " } else { "├── " };
            match node {
                ContractNode::Group(g) => {
                    let _ = writeln!(out, "{indent}{branch}📂 {label}");
                    g.render(depth + 1, out);
                }
                ContractNode::Collection(c) => {
                    let _ = writeln!(out, "{indent}{branch}📂 {label} ({} streams)", c.len());
                    let inner = "    ".repeat(depth + 1);
                    for (j, stream) in c.iter().enumerate() {
                        let s_branch = if j + 1 == c.len() { "└── " } else { "├── " };
                        let marker = if stream.is_loaded() { "" } else { "❓" };
                        let _ = writeln!(
                            out,
                            "{inner}{s_branch}📄{marker} {} [{}]",
                            stream.name(),
                            stream.kind()
                        );
                    }
                }
            }
        }
    }
}

/// Top-level contract an analysis consumer constructs and queries
#[derive(Debug)]
pub struct DataContract {
    name: String,
    root: ContractGroup,
}

impl DataContract {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root: ContractGroup::new(name.clone()),
            name,
        }
    }

    /// Add a top-level group or collection
    pub fn with(
        mut self,
        label: impl Into<String>,
        node: impl Into<ContractNode>,
    ) -> Result<Self, ContractError> {
        self.root.try_insert(label, node)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &ContractGroup {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ContractGroup {
        &mut self.root
    }

    /// Top-level group by label
    pub fn group(&self, label: &str) -> Result<&ContractGroup, ContractError> {
        self.root.group(label)
    }

    /// Resolve a `/`-separated label path to a node
    pub fn node(&self, path: &str) -> Result<&ContractNode, ContractError> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments
            .next()
            .ok_or_else(|| ContractError::not_found(&self.name, path))?;
        let mut node = self
            .root
            .get(first)
            .ok_or_else(|| ContractError::not_found(&self.name, first))?;
        let mut walked = first.to_string();
        for segment in segments {
            let group = node
                .as_group()
                .ok_or_else(|| ContractError::not_found(&walked, segment))?;
            node = group
                .get(segment)
                .ok_or_else(|| ContractError::not_found(&walked, segment))?;
            walked = join_path(&walked, segment);
        }
        Ok(node)
    }

    /// Resolve a `/`-separated path to a collection
    pub fn collection(&self, path: &str) -> Result<&DataStreamCollection, ContractError> {
        self.node(path)?
            .as_collection()
            .ok_or_else(|| ContractError::not_found(&self.name, path))
    }

    /// Resolve `group/.../collection/stream`
    pub fn stream(&self, path: &str) -> Result<&DataStream, ContractError> {
        let (parent, name) = path
            .rsplit_once('/')
            .ok_or_else(|| ContractError::not_found(&self.name, path))?;
        self.collection(parent)?.stream(name)
    }

    pub fn stream_mut(&mut self, path: &str) -> Result<&mut DataStream, ContractError> {
        let (parent, name) = path
            .rsplit_once('/')
            .ok_or_else(|| ContractError::not_found(&self.name, path))?;
        let mut segments = parent.split('/').filter(|s| !s.is_empty()).peekable();
        let mut group = &mut self.root;
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                return group.collection_mut(segment)?.stream_mut(name);
            }
            let container = group.label().to_string();
            group = match group.get_mut(segment) {
                Some(ContractNode::Group(g)) => g,
                _ => return Err(ContractError::not_found(container, segment)),
            };
        }
        Err(ContractError::not_found(&self.name, path))
    }

    /// Every stream with its full label path, depth first
    pub fn walk_streams(&self) -> Vec<(String, &DataStream)> {
        let mut out = Vec::new();
        self.root.collect_streams("", &mut out);
        out
    }

    /// Mutable access to every stream, for caller-managed parallel loading
    pub fn streams_mut(&mut self) -> Vec<(String, &mut DataStream)> {
        let mut out = Vec::new();
        self.root.collect_streams_mut("", &mut out);
        out
    }

    /// Load every stream in the tree
    ///
    /// Non-strict mode returns `(path, error)` for each failure and leaves
    /// the remaining streams loaded; strict mode stops at the first error.
    pub fn load_all(&mut self, strict: bool) -> Result<Vec<(String, ContractError)>, ContractError> {
        let mut failures = Vec::new();
        for (path, stream) in self.streams_mut() {
            let result = stream.load().map(|_| ());
            if let Err(e) = result {
                if strict {
                    return Err(e);
                }
                failures.push((path, e));
            }
        }
        Ok(failures)
    }

    /// Tree rendering of groups, collections and streams
    pub fn tree(&self) -> String {
        let mut out = format!("📂 {}\n", self.name);
        self.root.render(0, &mut out);
        out
    }
}

fn join_path(prefix: &str, label: &str) -> String {
    if prefix.is_empty() {
        label.to_string()
    } else {
        format!("{prefix}/{label}")
    }
}
