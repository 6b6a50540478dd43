use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid setting '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// The full render configuration, deserializable from TOML.
///
/// Every option has a default; a settings file only lists what it overrides.
/// Unknown keys are rejected so typos fail loudly. The record is validated as
/// a whole before the engine accepts it, and snapshots are immutable per
/// operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    // Geometry style.
    pub size_factor: f64,
    pub bond_thickness: f64,
    pub bond_length_tolerance: f64,
    pub smooth_bonds: bool,

    // Camera. `fov` is the vertical field of view in degrees for perspective
    // projection, and the frame height in Å for orthographic.
    pub fov: f64,
    pub z_near: f64,
    pub z_far: f64,
    pub orthographic: bool,

    // Shading.
    pub ambient_color: [f32; 3],
    pub sun_color: [f32; 3],
    pub sun_position: [f64; 3],
    pub brightness: f64,
    pub outline_radius: u32,
    pub clear_color: [f32; 3],

    // Ambient occlusion.
    pub ao_intensity: f64,
    pub ao_radius: f64,
    pub ao_exponent: f64,
    pub ao_iterations: u32,

    // Cubemap generation. The original implementation spelled the clearance
    // option "cubemap_clearence"; that spelling is still accepted.
    #[serde(alias = "cubemap_clearence")]
    pub cubemap_clearance: f64,
    pub cubemap_density: f64,
    pub cubemap_slice_count: usize,
    pub cubemap_use_gpu: bool,

    // Isosurface and volumetric rendering. The isovalue is given in atomic
    // units and converted at comparison time.
    pub isovalue: f64,
    pub isosurface_roughness: f64,
    pub isosurface_metallicity: f64,
    pub volumetric_density: f64,
    pub volumetric_iterations: u32,
    pub volumetric_light_distance: f64,
    pub volumetric_light_iterations: u32,
    pub volumetric_cutoff: f64,
    pub volumetric_gradient: f64,
    pub volumetric_shadowmap: bool,
    pub emissive_volume: bool,
    pub volumetric_color_mode: bool,

    // Orbital coloring.
    pub mo_color_0: [f32; 3],
    pub mo_color_1: [f32; 3],
    pub premultiply_color: bool,

    // Anti-aliasing: samples per pixel axis.
    pub aa_quality: u32,

    // Accepted and stored without a current effect on bond inference.
    pub multicenter_coordination: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            size_factor: 0.2,
            bond_thickness: 0.2,
            bond_length_tolerance: 0.3,
            smooth_bonds: false,

            fov: 70.0,
            z_near: 0.3,
            z_far: 300.0,
            orthographic: false,

            ambient_color: [0.4, 0.4, 0.4],
            sun_color: [2.0, 2.0, 2.0],
            sun_position: [2.0, 1.0, 1.0],
            brightness: 1.0,
            outline_radius: 2,
            clear_color: [1.0, 1.0, 1.0],

            ao_intensity: 1.0,
            ao_radius: 0.5,
            ao_exponent: 2.0,
            ao_iterations: 16,

            cubemap_clearance: 4.0,
            cubemap_density: 8.0,
            cubemap_slice_count: 1,
            cubemap_use_gpu: true,

            isovalue: 0.02,
            isosurface_roughness: 0.5,
            isosurface_metallicity: 0.0,
            volumetric_density: 50.0,
            volumetric_iterations: 100,
            volumetric_light_distance: 3.0,
            volumetric_light_iterations: 5,
            volumetric_cutoff: 1e-5,
            volumetric_gradient: 1.0,
            volumetric_shadowmap: true,
            emissive_volume: false,
            volumetric_color_mode: false,

            mo_color_0: [1.0, 0.25, 0.0],
            mo_color_1: [0.0, 0.4, 1.0],
            premultiply_color: true,

            aa_quality: 1,

            multicenter_coordination: false,
        }
    }
}

fn require(condition: bool, field: &'static str, message: &str) -> Result<(), SettingsError> {
    if condition {
        Ok(())
    } else {
        Err(SettingsError::Invalid {
            field,
            message: message.to_string(),
        })
    }
}

impl RenderSettings {
    /// Validates the whole record; the first violation is reported with the
    /// offending field name.
    pub fn validate(&self) -> Result<(), SettingsError> {
        require(
            self.size_factor.is_finite() && self.size_factor > 0.0,
            "size_factor",
            "must be positive",
        )?;
        require(
            self.bond_thickness.is_finite() && self.bond_thickness > 0.0,
            "bond_thickness",
            "must be positive",
        )?;
        require(
            self.bond_length_tolerance.is_finite() && self.bond_length_tolerance >= 0.0,
            "bond_length_tolerance",
            "must be non-negative",
        )?;
        require(
            self.fov.is_finite() && self.fov > 0.0,
            "fov",
            "must be positive",
        )?;
        require(
            self.z_near.is_finite() && self.z_near > 0.0,
            "z_near",
            "must be positive",
        )?;
        require(
            self.z_far.is_finite() && self.z_far > self.z_near,
            "z_far",
            "must be greater than z_near",
        )?;
        require(
            self.brightness.is_finite() && self.brightness >= 0.0,
            "brightness",
            "must be non-negative",
        )?;
        require(
            self.ao_intensity.is_finite() && self.ao_intensity >= 0.0,
            "ao_intensity",
            "must be non-negative",
        )?;
        require(
            self.ao_radius.is_finite() && self.ao_radius >= 0.0,
            "ao_radius",
            "must be non-negative",
        )?;
        require(
            self.ao_exponent.is_finite() && self.ao_exponent >= 0.0,
            "ao_exponent",
            "must be non-negative",
        )?;
        require(
            self.cubemap_clearance.is_finite() && self.cubemap_clearance >= 0.0,
            "cubemap_clearance",
            "must be non-negative",
        )?;
        require(
            self.cubemap_density.is_finite() && self.cubemap_density > 0.0,
            "cubemap_density",
            "must be positive",
        )?;
        require(
            self.cubemap_slice_count >= 1,
            "cubemap_slice_count",
            "must be at least 1",
        )?;
        require(
            self.isovalue.is_finite() && self.isovalue > 0.0,
            "isovalue",
            "must be positive",
        )?;
        require(
            self.isosurface_roughness.is_finite() && self.isosurface_roughness >= 0.0,
            "isosurface_roughness",
            "must be non-negative",
        )?;
        require(
            self.isosurface_metallicity.is_finite() && self.isosurface_metallicity >= 0.0,
            "isosurface_metallicity",
            "must be non-negative",
        )?;
        require(
            self.volumetric_density.is_finite() && self.volumetric_density >= 0.0,
            "volumetric_density",
            "must be non-negative",
        )?;
        require(
            self.volumetric_iterations >= 1,
            "volumetric_iterations",
            "must be at least 1",
        )?;
        require(
            self.volumetric_light_distance.is_finite() && self.volumetric_light_distance >= 0.0,
            "volumetric_light_distance",
            "must be non-negative",
        )?;
        require(
            self.volumetric_cutoff.is_finite() && self.volumetric_cutoff >= 0.0,
            "volumetric_cutoff",
            "must be non-negative",
        )?;
        require(
            self.volumetric_gradient.is_finite()
                && (0.0..=1.0).contains(&self.volumetric_gradient),
            "volumetric_gradient",
            "must be between 0 and 1",
        )?;
        require(self.aa_quality >= 1, "aa_quality", "must be at least 1")?;
        Ok(())
    }

    /// Parses and validates a settings record from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML fails to parse, carries an unknown key,
    /// or the resulting record is invalid.
    pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads and validates a settings record from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the content is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RenderSettings::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_merges_over_defaults() {
        let settings = RenderSettings::from_toml_str(
            "isovalue = 0.05\nsmooth_bonds = true\n",
        )
        .unwrap();
        assert_eq!(settings.isovalue, 0.05);
        assert!(settings.smooth_bonds);
        assert_eq!(settings.fov, 70.0);
    }

    #[test]
    fn the_historical_clearance_spelling_is_accepted() {
        let settings = RenderSettings::from_toml_str("cubemap_clearence = 6.5\n").unwrap();
        assert_eq!(settings.cubemap_clearance, 6.5);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            RenderSettings::from_toml_str("isovaleu = 0.05\n"),
            Err(SettingsError::Toml(_))
        ));
    }

    #[test]
    fn validation_names_the_offending_field() {
        let mut settings = RenderSettings::default();
        settings.fov = 0.0;
        match settings.validate() {
            Err(SettingsError::Invalid { field, .. }) => assert_eq!(field, "fov"),
            other => panic!("expected invalid fov, got {other:?}"),
        }

        let mut settings = RenderSettings::default();
        settings.z_far = settings.z_near;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { field: "z_far", .. })
        ));

        let mut settings = RenderSettings::default();
        settings.aa_quality = 0;
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid {
                field: "aa_quality",
                ..
            })
        ));
    }

    #[test]
    fn serialized_settings_round_trip() {
        let mut settings = RenderSettings::default();
        settings.isovalue = 0.04;
        settings.orthographic = true;
        let text = toml::to_string(&settings).unwrap();
        assert_eq!(RenderSettings::from_toml_str(&text).unwrap(), settings);
    }
}
