use log::info;
use naia_reference::{
    write_replica_full, HostType, ObjectUpdate, ReplicaError, ReplicationConfig,
    ReplicationSession, StreamWriter,
};

use crate::{TestComponent, TestObject, TestReplica, TestReplicas, TestWorld};

/// One end of a connection: its spawn table, its replicas and the session
/// that replicates between them
pub struct TestPeer {
    pub session: ReplicationSession<TestObject>,
    pub world: TestWorld,
    pub replicas: TestReplicas,
}

impl TestPeer {
    pub fn new(host_type: HostType) -> Self {
        Self::with_config(host_type, ReplicationConfig::default())
    }

    pub fn with_config(host_type: HostType, config: ReplicationConfig) -> Self {
        Self {
            session: ReplicationSession::open(host_type, config),
            world: TestWorld::new(),
            replicas: TestReplicas::default(),
        }
    }

    pub fn server() -> Self {
        Self::new(HostType::Server)
    }

    pub fn client() -> Self {
        Self::new(HostType::Client)
    }

    /// Spawns an object locally, returning how many waiting references it
    /// resolved
    pub fn spawn(&mut self, id: u64) -> usize {
        let object = self.world.spawn(id);
        let resolved = self.session.object_spawned(object);
        info!(
            "TestPeer: {:?} spawned object {}, resolving {} references",
            self.session.host_type(),
            id,
            resolved
        );
        resolved
    }

    pub fn despawn(&mut self, id: u64) {
        info!("TestPeer: {:?} despawned object {}", self.session.host_type(), id);
        self.world.despawn(id);
        if let Some(replica) = self.replicas.get_mut(id) {
            self.session.object_despawned(replica);
        }
        self.replicas.remove(id);
    }

    /// Spawns `id` with an authority replica
    pub fn host_replica(&mut self, id: u64, target: TestComponent, members: Vec<TestComponent>) {
        self.spawn(id);
        let members = self.session.host_list(members);
        let replica = self.replicas.insert(TestReplica::host(id, target, members));
        self.session.bind(replica);
    }

    /// Adds a replica that mirrors the remote authority's object `id`.
    /// It is tracked too, so a relaying peer sweeps what it received.
    pub fn mirror_replica(&mut self, id: u64) {
        let replica = self.replicas.insert(TestReplica::mirror(id));
        self.session.bind(replica);
    }

    pub fn replica(&self, id: u64) -> &TestReplica {
        self.replicas.get(id).expect("no replica for object")
    }

    pub fn replica_mut(&mut self, id: u64) -> &mut TestReplica {
        self.replicas.get_mut(id).expect("no replica for object")
    }

    pub fn sweep(&mut self) -> Result<Vec<ObjectUpdate>, ReplicaError> {
        let updates = self.session.sweep(&mut self.replicas)?;
        info!(
            "TestPeer: {:?} swept {} updates",
            self.session.host_type(),
            updates.len()
        );
        Ok(updates)
    }

    pub fn receive(&mut self, updates: &[ObjectUpdate], keep_dirty_delta: bool) -> Result<(), ReplicaError> {
        for update in updates {
            self.session
                .apply_update(update, &mut self.replicas, &self.world, keep_dirty_delta)?;
        }
        Ok(())
    }

    pub fn full_state(&self, id: u64) -> Result<Vec<u8>, ReplicaError> {
        let mut writer = StreamWriter::new();
        write_replica_full(self.replica(id), &mut writer)?;
        Ok(writer.to_bytes())
    }

    pub fn receive_full(&mut self, id: u64, payload: &[u8]) -> Result<(), ReplicaError> {
        let replica = self.replicas.get_mut(id).expect("no replica for object");
        self.session.apply_full(payload, replica, &self.world)
    }
}
