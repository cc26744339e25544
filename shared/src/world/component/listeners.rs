use std::rc::Rc;

/// Identifies a listener so it can be removed later
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

impl ListenerId {
    pub(crate) fn new(id: u32) -> Self {
        Self(id)
    }
}

pub(crate) type Listener<A> = Rc<dyn Fn(&A)>;

pub(crate) struct Listeners<A> {
    listeners: Vec<(ListenerId, Listener<A>)>,
}

impl<A> Listeners<A> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add(&mut self, id: ListenerId, listener: impl Fn(&A) + 'static) {
        self.listeners.push((id, Rc::new(listener)));
    }

    pub fn remove(&mut self, id: &ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| listener_id != id);
        self.listeners.len() != before
    }

    /// Listeners registered at this moment. Firing from a snapshot keeps
    /// listeners added during a notification out of that notification.
    pub fn snapshot(&self) -> Vec<Listener<A>> {
        self.listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect()
    }
}

pub(crate) fn notify<A>(listeners: Vec<Listener<A>>, arg: &A) {
    for listener in listeners {
        listener(arg);
    }
}
