//! Specialized collection types

pub use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Generational key for a node owned by a scene graph
    ///
    /// A key to a destroyed node never aliases a node created later.
    pub struct NodeHandle;

    /// Generational key for one in-flight or finished marker composition
    pub struct CompositionId;
}

/// Handle-based map keyed by scene nodes
pub type NodeMap<T> = SlotMap<NodeHandle, T>;
