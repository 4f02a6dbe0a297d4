//! Tunable settings for the iterative routines.
//!
//! Every stepped search in the crate has a cap on the number of iterations. The defaults are
//! generous enough that no well formed sounding should come near them.
use metfor::{HectoPascal, JpKg};

/// Settings for lifting a parcel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiftConfig {
    /// Thickness of the slices used to integrate CIN between the lifting level and the LCL.
    pub cin_step: HectoPascal,
    /// Step used to refine the LFC and EL between two sounding levels.
    pub lfc_el_step: HectoPascal,
    /// Step used when searching for the maximum parcel level.
    pub mpl_step: HectoPascal,
    /// Maximum number of steps in any of the stepped searches.
    pub max_search_steps: usize,
    /// Negative buoyancy only counts towards CIN below this level.
    pub cin_pressure_floor: HectoPascal,
    /// Settings for the saturated adiabat solver.
    pub saturation: SaturationConfig,
}

impl Default for LiftConfig {
    fn default() -> Self {
        LiftConfig {
            cin_step: HectoPascal(10.0),
            lfc_el_step: HectoPascal(5.0),
            mpl_step: HectoPascal(1.0),
            max_search_steps: 1200,
            cin_pressure_floor: HectoPascal(500.0),
            saturation: SaturationConfig::default(),
        }
    }
}

/// Settings for the secant solver that finds the temperature on a saturated adiabat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationConfig {
    /// Stop iterating when the correction falls below this value.
    pub tolerance: f64,
    /// Give up after this many iterations.
    pub max_iterations: usize,
}

impl Default for SaturationConfig {
    fn default() -> Self {
        SaturationConfig {
            tolerance: 0.001,
            max_iterations: 100,
        }
    }
}

/// Thresholds that define the effective inflow layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveLayerConfig {
    /// Minimum CAPE for a level to be in the effective inflow layer.
    pub ecape: JpKg,
    /// CIN must be greater than (less negative than) this value.
    pub ecinh: JpKg,
}

impl Default for EffectiveLayerConfig {
    fn default() -> Self {
        EffectiveLayerConfig {
            ecape: JpKg(100.0),
            ecinh: JpKg(-250.0),
        }
    }
}

/// Default number of samples used for a layer mean wind.
pub const MEAN_WIND_STEPS: usize = 20;
