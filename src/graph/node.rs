use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use crate::engine::UnitId;

/// Something other nodes can connect into.
pub trait Sinkable {
    /// Unit whose input receives the connection.
    fn input(&self) -> UnitId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Oscillator,
    PeriodicWaveOscillator,
    Filter,
    Gain,
    Analyser,
}

/// Which parent a node records when it is attached to a destination node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ancestry {
    /// The destination itself.
    Direct,
    /// The destination's own parent, possibly none. Used by pass-through
    /// stages (gain, analyser) that stay invisible in the ancestry chain.
    Transparent,
}

/// A node taking part in parent/child bookkeeping.
pub trait Ancestral: Send + Sync {
    fn id(&self) -> UnitId;

    fn kind(&self) -> NodeKind;

    fn links(&self) -> &NodeLinks;

    fn ancestry(&self) -> Ancestry {
        Ancestry::Direct
    }

    fn parent(&self) -> Option<Arc<dyn Ancestral>> {
        self.links().parent()
    }

    /// Nodes constructed with this node as their destination, in order.
    fn children(&self) -> Vec<Arc<dyn Ancestral>> {
        self.links().children()
    }
}

/// Non-owning parent/children links. The parent is written once, on attach.
#[derive(Default)]
pub struct NodeLinks {
    parent: OnceLock<Option<Weak<dyn Ancestral>>>,
    children: RwLock<Vec<Weak<dyn Ancestral>>>,
}

impl NodeLinks {
    pub fn is_attached(&self) -> bool {
        self.parent.get().is_some()
    }

    pub fn parent(&self) -> Option<Arc<dyn Ancestral>> {
        self.parent.get()?.as_ref()?.upgrade()
    }

    pub fn children(&self) -> Vec<Arc<dyn Ancestral>> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    pub(crate) fn parent_link(&self) -> Option<Weak<dyn Ancestral>> {
        self.parent.get().cloned().flatten()
    }

    /// Returns false if a parent was already recorded.
    pub(crate) fn set_parent(&self, parent: Option<Weak<dyn Ancestral>>) -> bool {
        self.parent.set(parent).is_ok()
    }

    pub(crate) fn push_child(&self, child: Weak<dyn Ancestral>) {
        self.children
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(child);
    }
}

/// The terminal output sink. Accepts connections but has no ancestry.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputSink;

impl Sinkable for OutputSink {
    fn input(&self) -> UnitId {
        UnitId::OUTPUT
    }
}

/// Where a node sends its output.
#[derive(Clone)]
pub enum Destination {
    Output(OutputSink),
    Node {
        input: UnitId,
        node: Arc<dyn Ancestral>,
    },
}

impl Destination {
    pub fn input(&self) -> UnitId {
        match self {
            Destination::Output(sink) => sink.input(),
            Destination::Node { input, .. } => *input,
        }
    }

    /// The destination's ancestry capability, absent for the output sink.
    pub fn node(&self) -> Option<&Arc<dyn Ancestral>> {
        match self {
            Destination::Output(_) => None,
            Destination::Node { node, .. } => Some(node),
        }
    }
}

impl<N> From<&Arc<N>> for Destination
where
    N: Sinkable + Ancestral + 'static,
{
    fn from(node: &Arc<N>) -> Self {
        Destination::Node {
            input: node.input(),
            node: node.clone(),
        }
    }
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Output(_) => f.write_str("Output"),
            Destination::Node { input, node } => f
                .debug_struct("Node")
                .field("input", input)
                .field("kind", &node.kind())
                .finish(),
        }
    }
}
