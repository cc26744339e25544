/// Which side of the connection may mutate a replicated variable
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    /// Local authority; mutations are encoded and sent
    HostOwned,
    /// Mirrors the authority; only decoding changes the value
    RemoteOwned,
}

impl Ownership {
    pub fn name(&self) -> &'static str {
        match self {
            Ownership::HostOwned => "HostOwned",
            Ownership::RemoteOwned => "RemoteOwned",
        }
    }

    pub fn is_host_owned(&self) -> bool {
        matches!(self, Ownership::HostOwned)
    }
}
