use crate::error::DeviceResult;
use crate::model::MachineProfile;

/// Read-only access to machine capability data.
///
/// The recommendation engine only ever queries machines by id; where the
/// profiles come from (built-in table, JSON file, a database) is up to the
/// implementor.
pub trait MachineProvider: Send + Sync {
    /// Resolve a machine identifier, failing with `MachineNotFound` if unknown.
    fn get_machine(&self, id: &str) -> DeviceResult<MachineProfile>;

    /// All known machines, ordered by id.
    fn list_machines(&self) -> Vec<MachineProfile>;
}
