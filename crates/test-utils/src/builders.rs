#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use fastpipe::config::{ConfigFile, RawConfigFile};
use fastpipe::fs::mock::MockFileSystem;
use fastpipe::fs::FileSystem;
use fastpipe::types::{CheckMode, HashStorageMode};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults but with a single seed and short speed
/// lists so generated task sets stay small.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.config.hash_storage = HashStorageMode::Memory;
        config.sweep.steady_wind_speeds = vec![8.0, 12.0];
        config.sweep.linearised_wind_speeds = vec![8.0];
        config.sweep.linearised_rotor_speeds = vec![9.0, 10.0];
        config.sweep.num_seeds = 1;
        Self { config }
    }

    /// The untouched built-in defaults.
    pub fn defaults() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn check(mut self, mode: CheckMode) -> Self {
        self.config.config.check = mode;
        self
    }

    pub fn hash_storage(mut self, mode: HashStorageMode) -> Self {
        self.config.config.hash_storage = mode;
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.config.jobs = jobs;
        self
    }

    pub fn num_seeds(mut self, n: u32) -> Self {
        self.config.sweep.num_seeds = n;
        self
    }

    pub fn seed_base_offset(mut self, offset: u64) -> Self {
        self.config.sweep.seed_base_offset = offset;
        self
    }

    pub fn steady_wind_speeds(mut self, speeds: &[f64]) -> Self {
        self.config.sweep.steady_wind_speeds = speeds.to_vec();
        self
    }

    pub fn linearised_wind_speeds(mut self, speeds: &[f64]) -> Self {
        self.config.sweep.linearised_wind_speeds = speeds.to_vec();
        self
    }

    pub fn linearised_rotor_speeds(mut self, speeds: &[f64]) -> Self {
        self.config.sweep.linearised_rotor_speeds = speeds.to_vec();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub const STEADY_MAIN: &str = "\
------- OpenFAST INPUT FILE -------------------------------------------
Steady wind, NREL 5MW reference turbine
      600   TMax           - Total run time (s)
\"NREL5MW_ElastoDyn.dat\"    EDFile         - Name of file containing ElastoDyn input parameters
\"NREL5MW_InflowWind.dat\"   InflowFile     - Name of file containing inflow wind input parameters
\"NREL5MW_ServoDyn.dat\"     ServoFile      - Name of file containing control and electrical-drive input parameters
";

pub const TURBULENT_MAIN: &str = "\
------- OpenFAST INPUT FILE -------------------------------------------
Turbulent wind, NREL 5MW reference turbine
      600   TMax           - Total run time (s)
\"NREL5MW_ElastoDyn.dat\"    EDFile         - Name of file containing ElastoDyn input parameters
\"NREL5MW_InflowWind.dat\"   InflowFile     - Name of file containing inflow wind input parameters
";

pub const LINEARISED_MAIN: &str = "\
------- OpenFAST INPUT FILE -------------------------------------------
Linearisation at fixed rotor speed
\"NREL5MW_ElastoDyn.dat\"    EDFile         - Name of file containing ElastoDyn input parameters
\"NREL5MW_InflowWind.dat\"   InflowFile     - Name of file containing inflow wind input parameters
         True   Linearize      - Linearization analysis
";

pub const SINUSOIDAL_MAIN: &str = "\
------- OpenFAST INPUT FILE -------------------------------------------
Sinusoidal gust
\"NREL5MW_InflowWind.dat\"   InflowFile     - Name of file containing inflow wind input parameters
";

pub const STEADY_INFLOW: &str = "\
------- InflowWind INPUT FILE -------------------------------------------------------------------------
          1   WindType       - switch for wind file type (1=steady; 3=binary TurbSim FF)
         12   HWindSpeed     - Horizontal wind speed (m/s)
         90   RefHt          - Reference height for horizontal wind speed (m)
";

pub const TURBULENT_INFLOW: &str = "\
------- InflowWind INPUT FILE -------------------------------------------------------------------------
          3   WindType       - switch for wind file type (1=steady; 3=binary TurbSim FF)
         12   HWindSpeed     - Horizontal wind speed (m/s)
\"Wind/90m_12mps_twr.bts\"    FileName_BTS   - Name of the Full field wind file to use (.bts)
";

pub const ELASTODYN: &str = "\
------- ELASTODYN INPUT FILE -------------------------------------------
       12.1   RotSpeed       - Initial or fixed rotor speed (rpm)
          0   BlPitch(1)     - Blade 1 initial pitch (degrees)
\"NREL5MW_ElastoDyn_Tower.dat\"    TwrFile        - Name of file containing tower properties
";

pub const ELASTODYN_TOWER: &str = "\
------- ELASTODYN TOWER INPUT FILE -------------------------------------
        1.0   TwrFADmp(1)    - Tower 1st fore-aft mode structural damping ratio (%)
";

pub const SERVODYN: &str = "\
------- SERVODYN INPUT FILE --------------------------------------------
          5   PCMode         - Pitch control mode
\"../../../controller/ROSCO/build/DISCON.dll\"    DLL_FileName   - Name/location of the dynamic library
";

pub const TURBSIM_INPUT: &str = "\
---------TurbSim v2.00.* Input File------------------------
13420   RandSeed1       - First random seed  (-2147483648 to 2147483647)
\"RanLux\"  RandSeed2       - Second random seed
       90   HubHt           - Hub height [m]
";

pub const GUST_SCRIPT: &str = "\
import numpy as np
np.savetxt(\"wind_8ms_1ms_1rads.wnd\", np.zeros((2, 8)))
";

/// An in-memory project tree with one scenario of each kind, a turbulence
/// input and a controller.
///
/// ```text
/// simulations/steady_wind/                    main.fst + 4 module files
/// simulations/turbulent/                      main.fst + 3 module files
/// simulations/linearised_fixed_rotor_speed/   main.fst + 3 module files
/// simulations/sinusoidal_gust/                gust script + wind_8ms_1ms_1rads.fst + inflow file
/// wind/90m_12mps_twr.inp
/// controller/ROSCO/{CMakeLists.txt, DISCON.F90}
/// ```
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    fs: MockFileSystem,
}

impl ProjectFixture {
    /// Empty tree.
    pub fn empty() -> Self {
        Self {
            fs: MockFileSystem::new(),
        }
    }

    /// The full tree described above.
    pub fn standard() -> Self {
        Self::empty()
            .with_steady_wind("steady_wind")
            .with_turbulent("turbulent")
            .with_fixed_rotor_speed("linearised_fixed_rotor_speed")
            .with_sinusoidal("sinusoidal_gust")
            .with_wind_input("90m_12mps_twr")
            .with_controller("ROSCO")
    }

    pub fn with_steady_wind(self, name: &str) -> Self {
        let dir = format!("simulations/{name}");
        self.file(format!("{dir}/main.fst"), STEADY_MAIN)
            .file(format!("{dir}/NREL5MW_InflowWind.dat"), STEADY_INFLOW)
            .file(format!("{dir}/NREL5MW_ElastoDyn.dat"), ELASTODYN)
            .file(format!("{dir}/NREL5MW_ElastoDyn_Tower.dat"), ELASTODYN_TOWER)
            .file(format!("{dir}/NREL5MW_ServoDyn.dat"), SERVODYN)
    }

    pub fn with_turbulent(self, name: &str) -> Self {
        let dir = format!("simulations/{name}");
        self.file(format!("{dir}/main.fst"), TURBULENT_MAIN)
            .file(format!("{dir}/NREL5MW_InflowWind.dat"), TURBULENT_INFLOW)
            .file(format!("{dir}/NREL5MW_ElastoDyn.dat"), ELASTODYN)
            .file(format!("{dir}/NREL5MW_ElastoDyn_Tower.dat"), ELASTODYN_TOWER)
    }

    pub fn with_fixed_rotor_speed(self, name: &str) -> Self {
        let dir = format!("simulations/{name}");
        self.file(format!("{dir}/main.fst"), LINEARISED_MAIN)
            .file(format!("{dir}/NREL5MW_InflowWind.dat"), STEADY_INFLOW)
            .file(format!("{dir}/NREL5MW_ElastoDyn.dat"), ELASTODYN)
            .file(format!("{dir}/NREL5MW_ElastoDyn_Tower.dat"), ELASTODYN_TOWER)
    }

    pub fn with_sinusoidal(self, name: &str) -> Self {
        let dir = format!("simulations/{name}");
        self.file(format!("{dir}/generate_inflow_gust.py"), GUST_SCRIPT)
            .file(format!("{dir}/wind_8ms_1ms_1rads.fst"), SINUSOIDAL_MAIN)
            .file(format!("{dir}/NREL5MW_InflowWind.dat"), STEADY_INFLOW)
    }

    pub fn with_wind_input(self, stem: &str) -> Self {
        self.file(format!("wind/{stem}.inp"), TURBSIM_INPUT)
    }

    pub fn with_controller(self, name: &str) -> Self {
        let dir = format!("controller/{name}");
        self.file(
            format!("{dir}/CMakeLists.txt"),
            "project(ROSCO Fortran)\nadd_library(DISCON SHARED src/DISCON.F90)\n",
        )
        .file(format!("{dir}/DISCON.F90"), "SUBROUTINE DISCON()\nEND SUBROUTINE DISCON\n")
    }

    pub fn file(self, path: impl AsRef<Path>, content: &str) -> Self {
        self.fs.add_file(path, content);
        self
    }

    pub fn mock(&self) -> &MockFileSystem {
        &self.fs
    }

    /// Shared handle on the same in-memory tree.
    pub fn fs(&self) -> Arc<dyn FileSystem> {
        Arc::new(self.fs.clone())
    }

    pub fn read(&self, path: impl AsRef<Path>) -> String {
        self.fs
            .read_to_string(path.as_ref())
            .unwrap_or_else(|e| panic!("reading {:?}: {e}", path.as_ref()))
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.fs.exists(path.as_ref())
    }
}
