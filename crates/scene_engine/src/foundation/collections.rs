//! Generation-checked handles
//!
//! Nodes, registered behaviours and simulated bodies are stored in slot maps.
//! A handle stays valid until its slot is freed; a stale handle never aliases
//! whatever later reuses the slot.

pub use slotmap::{SlotMap, Key, KeyData};

slotmap::new_key_type! {
    /// Handle to a node in a [`World`](crate::ecs::World)
    pub struct NodeId;

    /// Handle to a behaviour registered with the frame driver
    pub struct BehaviourId;

    /// Handle to a body tracked by a physics backend
    pub struct BodyHandle;
}

impl BodyHandle {
    /// Pack the handle into a backend user-data word
    pub fn to_user_data(self) -> u128 {
        u128::from(self.data().as_ffi())
    }

    /// Recover a handle stored with [`BodyHandle::to_user_data`]
    pub fn from_user_data(user_data: u128) -> Option<Self> {
        let raw = u64::try_from(user_data).ok()?;
        Some(KeyData::from_ffi(raw).into())
    }
}
