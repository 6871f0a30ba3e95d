//! Modal visibility flags, one per dialog. Process-local, not persisted.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalKey {
    CreateHome,
    EditHome,
    CreateRoom,
    EditRoom,
    Item,
}

impl ModalKey {
    pub const ALL: [ModalKey; 5] = [
        ModalKey::CreateHome,
        ModalKey::EditHome,
        ModalKey::CreateRoom,
        ModalKey::EditRoom,
        ModalKey::Item,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModalFlags([bool; ModalKey::ALL.len()]);

impl ModalFlags {
    pub fn is_open(&self, key: ModalKey) -> bool {
        self.0[key.index()]
    }

    pub fn any_open(&self) -> bool {
        self.0.iter().any(|open| *open)
    }
}

#[derive(Debug)]
pub struct ModalStore {
    flags: watch::Sender<ModalFlags>,
}

impl Default for ModalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalStore {
    pub fn new() -> Self {
        Self {
            flags: watch::channel(ModalFlags::default()).0,
        }
    }

    pub fn open(&self, key: ModalKey) {
        self.set(key, true);
    }

    pub fn close(&self, key: ModalKey) {
        self.set(key, false);
    }

    pub fn close_all(&self) {
        self.flags.send_replace(ModalFlags::default());
    }

    pub fn is_open(&self, key: ModalKey) -> bool {
        self.flags.borrow().is_open(key)
    }

    pub fn flags(&self) -> ModalFlags {
        *self.flags.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ModalFlags> {
        self.flags.subscribe()
    }

    fn set(&self, key: ModalKey, open: bool) {
        self.flags
            .send_if_modified(|flags| std::mem::replace(&mut flags.0[key.index()], open) != open);
    }
}
