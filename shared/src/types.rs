/// Which end of a connection this process is. The server is the authority
/// for every replica it creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostType {
    Server,
    Client,
}
