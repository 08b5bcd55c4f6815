use crate::error::{DeviceError, DeviceResult};
use crate::model::{MachineProfile, MachineType};
use crate::traits::MachineProvider;
use std::collections::HashMap;
use std::path::Path;

/// Immutable-after-load collection of machine profiles.
#[derive(Debug, Clone, Default)]
pub struct MachineCatalog {
    machines: HashMap<String, MachineProfile>,
}

impl MachineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validated profile. Ids must be unique.
    pub fn add_machine(&mut self, profile: MachineProfile) -> DeviceResult<()> {
        profile.validate()?;
        if self.machines.contains_key(&profile.id) {
            return Err(DeviceError::MachineAlreadyExists(profile.id));
        }
        self.machines.insert(profile.id.clone(), profile);
        Ok(())
    }

    /// Load a catalog from a JSON array of machine profiles.
    pub fn load_from_file(path: &Path) -> DeviceResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let profiles: Vec<MachineProfile> = serde_json::from_str(&content)?;
        if profiles.is_empty() {
            return Err(DeviceError::LoadError(format!(
                "{} contains no machines",
                path.display()
            )));
        }

        let mut catalog = Self::new();
        for profile in profiles {
            catalog.add_machine(profile)?;
        }
        tracing::info!(
            path = %path.display(),
            machines = catalog.len(),
            "Loaded machine catalog"
        );
        Ok(catalog)
    }

    pub fn save_to_file(&self, path: &Path) -> DeviceResult<()> {
        let content = serde_json::to_string_pretty(&self.list_machines())?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }
}

impl MachineProvider for MachineCatalog {
    fn get_machine(&self, id: &str) -> DeviceResult<MachineProfile> {
        self.machines
            .get(id)
            .cloned()
            .ok_or_else(|| DeviceError::MachineNotFound(id.to_string()))
    }

    fn list_machines(&self) -> Vec<MachineProfile> {
        let mut machines: Vec<MachineProfile> = self.machines.values().cloned().collect();
        machines.sort_by(|a, b| a.id.cmp(&b.id));
        machines
    }
}

#[allow(clippy::too_many_arguments)]
fn reference_machine(
    id: &str,
    name: &str,
    model: &str,
    manufacturer: &str,
    machine_type: MachineType,
    max_rpm: u32,
    max_feed_rate: f64,
    spindle_power_kw: f64,
    min_tool_diameter: f64,
    max_tool_diameter: f64,
) -> MachineProfile {
    MachineProfile {
        id: id.to_string(),
        name: name.to_string(),
        model: model.to_string(),
        manufacturer: manufacturer.to_string(),
        machine_type,
        max_rpm,
        spindle_power_kw,
        max_feed_rate,
        min_tool_diameter,
        max_tool_diameter,
    }
}

/// Built-in catalog of common shop machines
pub fn init_standard_catalog() -> MachineCatalog {
    let machines = [
        reference_machine(
            "1",
            "Haas VF-2",
            "VF-2",
            "Haas",
            MachineType::VerticalMill,
            12000,
            500.0,
            22.4,
            0.5,
            89.0,
        ),
        reference_machine(
            "2",
            "DMG Mori NLX 2500",
            "NLX 2500",
            "DMG Mori",
            MachineType::Lathe,
            4000,
            300.0,
            18.5,
            1.0,
            76.0,
        ),
        reference_machine(
            "3",
            "Mazak INTEGREX i-200S",
            "INTEGREX i-200S",
            "Mazak",
            MachineType::MillTurn,
            12000,
            450.0,
            30.0,
            0.8,
            90.0,
        ),
        reference_machine(
            "4",
            "Okuma GENOS M560-V",
            "GENOS M560-V",
            "Okuma",
            MachineType::VerticalMill,
            15000,
            550.0,
            22.0,
            0.5,
            80.0,
        ),
    ];

    let mut catalog = MachineCatalog::new();
    for machine in machines {
        catalog.machines.insert(machine.id.clone(), machine);
    }
    catalog
}
