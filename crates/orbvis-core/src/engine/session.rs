//! The session: one loaded model plus everything derived from it.

use std::collections::BTreeSet;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use tracing::{info, instrument};

use crate::core::data::elements::CovalentRadiusTable;
use crate::core::field::evaluator::FieldTarget;
use crate::core::field::grid::ScalarField;
use crate::core::io::cube::CubeFile;
use crate::core::io::molden::MoldenFile;
use crate::core::io::traits::WavefunctionFile;
use crate::core::io::wfx::WfxFile;
use crate::core::io::xyz::XyzFile;
use crate::core::io::WavefunctionData;
use crate::core::models::atom::Atom;
use crate::core::models::basis::BasisSet;
use crate::core::models::molecule::Molecule;
use crate::core::models::orbital::{MolecularOrbital, OrbitalStore, Spin};
use crate::core::render::camera::Camera;
use crate::core::render::framebuffer::Framebuffer;
use crate::core::utils::geometry::Frame;
use crate::engine::cache::{FieldCache, FieldKey};
use crate::engine::cancel::CancelToken;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::properties::{ElementProperties, ElementPropertyTable};
use crate::engine::settings::RenderSettings;
use crate::engine::tasks::bonds::{self, BondChange};
use crate::engine::tasks::cubemap::{self, GridSpec, DEFAULT_MEMORY_CEILING_BYTES};
use crate::engine::tasks::frame::{self, FrameInputs};

/// One loaded molecular system and every piece of state derived from it:
/// the basis set and orbitals, element display properties, render settings,
/// camera, the cubemap resolution override, and the field cache.
///
/// All mutating operations take `&mut self`, so a session is naturally
/// single-writer; generation and rendering read immutable snapshots. Every
/// mutation is all-or-nothing: an operation that fails leaves the session
/// exactly as it was.
#[derive(Debug)]
pub struct Session {
    molecule: Molecule,
    basis: BasisSet,
    orbitals: OrbitalStore,
    elements: ElementPropertyTable,
    radii: CovalentRadiusTable,
    settings: RenderSettings,
    camera: Camera,
    cubemap_resolution: Option<[usize; 3]>,
    cache: FieldCache,
    current_field: Option<Arc<ScalarField>>,
    memory_ceiling: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An empty session with default settings and camera.
    pub fn new() -> Self {
        Self {
            molecule: Molecule::new(),
            basis: BasisSet::new(),
            orbitals: OrbitalStore::new(),
            elements: ElementPropertyTable::new(),
            radii: CovalentRadiusTable::default(),
            settings: RenderSettings::default(),
            camera: Camera::default(),
            cubemap_resolution: None,
            cache: FieldCache::new(),
            current_field: None,
            memory_ceiling: DEFAULT_MEMORY_CEILING_BYTES,
        }
    }

    /// Replaces the grid memory ceiling (bytes).
    pub fn set_memory_ceiling(&mut self, bytes: usize) {
        self.memory_ceiling = bytes;
    }

    /// The current model revision; bumped by every mutation that can
    /// invalidate a generated field.
    pub fn revision(&self) -> u64 {
        self.molecule.revision()
    }

    // --- Loading ---------------------------------------------------------

    /// Loads a Molden file, replacing the model, basis, and orbitals.
    #[instrument(skip_all, name = "load_molden")]
    pub fn load_molden(&mut self, reader: &mut impl BufRead) -> Result<(), EngineError> {
        let data = MoldenFile::read_from(reader)?;
        self.install_wavefunction(data);
        Ok(())
    }

    pub fn load_molden_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EngineError> {
        let data = MoldenFile::read_from_path(path)?;
        self.install_wavefunction(data);
        Ok(())
    }

    /// Loads an AIM WFX file, replacing the model, basis, and orbitals.
    #[instrument(skip_all, name = "load_wfx")]
    pub fn load_wfx(&mut self, reader: &mut impl BufRead) -> Result<(), EngineError> {
        let data = WfxFile::read_from(reader)?;
        self.install_wavefunction(data);
        Ok(())
    }

    pub fn load_wfx_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EngineError> {
        let data = WfxFile::read_from_path(path)?;
        self.install_wavefunction(data);
        Ok(())
    }

    /// Loads a plain XYZ file: geometry only, no wavefunction.
    #[instrument(skip_all, name = "load_xyz")]
    pub fn load_xyz(&mut self, reader: &mut impl BufRead) -> Result<(), EngineError> {
        let molecule = XyzFile::read_from(reader)?;
        self.install_geometry(molecule, None);
        Ok(())
    }

    pub fn load_xyz_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EngineError> {
        let molecule = XyzFile::read_from_path(path)?;
        self.install_geometry(molecule, None);
        Ok(())
    }

    /// Loads a Gaussian cube file: geometry plus a pre-sampled grid, which
    /// becomes the current field directly.
    #[instrument(skip_all, name = "load_cube")]
    pub fn load_cube(&mut self, reader: &mut impl BufRead) -> Result<(), EngineError> {
        let data = CubeFile::read_from(reader)?;
        self.install_geometry(data.molecule, data.field);
        Ok(())
    }

    pub fn load_cube_path<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EngineError> {
        let data = CubeFile::read_from_path(path)?;
        self.install_geometry(data.molecule, data.field);
        Ok(())
    }

    fn install_wavefunction(&mut self, data: WavefunctionData) {
        let WavefunctionData {
            mut molecule,
            basis,
            orbitals,
        } = data;
        bonds::rebuild(&mut molecule, &self.radii, self.settings.bond_length_tolerance);
        info!(
            atoms = molecule.atom_count(),
            basis_functions = basis.len(),
            orbitals = orbitals.len(),
            "Wavefunction loaded"
        );
        self.molecule = molecule;
        self.basis = basis;
        self.orbitals = orbitals;
        self.cache.clear();
        self.current_field = None;
    }

    fn install_geometry(&mut self, mut molecule: Molecule, field: Option<ScalarField>) {
        bonds::rebuild(&mut molecule, &self.radii, self.settings.bond_length_tolerance);
        info!(
            atoms = molecule.atom_count(),
            with_field = field.is_some(),
            "Geometry loaded"
        );
        self.molecule = molecule;
        self.basis = BasisSet::new();
        self.orbitals = OrbitalStore::new();
        self.cache.clear();
        self.current_field = field.map(Arc::new);
    }

    // --- Atoms and bonds -------------------------------------------------

    /// The atom at `index`.
    ///
    /// # Errors
    ///
    /// Fails with `AtomNotFound` for an unknown index.
    pub fn atom(&self, index: usize) -> Result<&Atom, EngineError> {
        self.molecule
            .atom(index)
            .ok_or(EngineError::AtomNotFound { index })
    }

    /// Appends an atom and returns its index. Bonds are not re-inferred.
    pub fn add_atom(&mut self, atomic_number: u32, position: Point3<f64>) -> usize {
        self.molecule.add_atom(atomic_number, position)
    }

    pub fn atom_count(&self) -> usize {
        self.molecule.atom_count()
    }

    /// Axis-aligned bounding box over all atom positions, `None` when empty.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        self.molecule.bounding_box()
    }

    /// Adds a bond between two atoms; see [`bonds::add`].
    pub fn add_bond(&mut self, a: usize, b: usize) -> Result<BondChange, EngineError> {
        bonds::add(&mut self.molecule, a, b)
    }

    /// Removes a bond between two atoms; see [`bonds::remove`].
    pub fn remove_bond(&mut self, a: usize, b: usize) -> Result<BondChange, EngineError> {
        bonds::remove(&mut self.molecule, a, b)
    }

    /// Re-infers the whole bond set from interatomic distances, discarding
    /// manual edits.
    pub fn rebuild_bonds(&mut self) {
        bonds::rebuild(
            &mut self.molecule,
            &self.radii,
            self.settings.bond_length_tolerance,
        );
    }

    pub fn bonds(&self) -> &BTreeSet<(usize, usize)> {
        self.molecule.bonds()
    }

    // --- Rigid transform -------------------------------------------------

    /// Rigidly re-anchors the whole model: the frame spanned by the three
    /// reference atoms is carried onto the frame at `position` spanned by
    /// `dir01` and `dir02`, and the same map is applied to every atom and
    /// every basis function center.
    ///
    /// # Errors
    ///
    /// Fails with `AtomNotFound` for an unknown reference and
    /// `InvalidArgument` for degenerate reference positions or target
    /// directions. A failed transform changes nothing.
    pub fn set_transform(
        &mut self,
        refs: [usize; 3],
        position: Point3<f64>,
        dir01: Vector3<f64>,
        dir02: Vector3<f64>,
    ) -> Result<(), EngineError> {
        let source = self.reference_frame(refs)?;
        let target = Frame::from_directions(position, dir01, dir02).ok_or_else(|| {
            EngineError::invalid_argument("target directions must be non-zero and non-parallel")
        })?;
        let map = source.rigid_map_to(&target);

        let moved: Vec<Point3<f64>> =
            self.molecule.positions().iter().map(|&p| map * p).collect();
        for (index, position) in moved.into_iter().enumerate() {
            self.molecule.set_position(index, position);
        }
        for function in self.basis.iter_mut() {
            function.center = map * function.center;
        }
        self.cache.purge_stale(self.molecule.revision());
        Ok(())
    }

    /// The frame currently spanned by three reference atoms.
    ///
    /// # Errors
    ///
    /// Fails with `AtomNotFound` for an unknown reference and
    /// `InvalidArgument` for coincident or collinear references.
    pub fn transform_frame(&self, refs: [usize; 3]) -> Result<Frame, EngineError> {
        self.reference_frame(refs)
    }

    fn reference_frame(&self, refs: [usize; 3]) -> Result<Frame, EngineError> {
        let p0 = self.atom(refs[0])?.position;
        let p1 = self.atom(refs[1])?.position;
        let p2 = self.atom(refs[2])?.position;
        Frame::from_points(p0, p1, p2).ok_or_else(|| {
            EngineError::invalid_argument("reference atoms are coincident or collinear")
        })
    }

    // --- Orbitals --------------------------------------------------------

    pub fn mo_count(&self) -> usize {
        self.orbitals.len()
    }

    /// The orbital at `index`: label, energy, occupation, spin, coefficients.
    ///
    /// # Errors
    ///
    /// Fails with `OrbitalNotFound` for an unknown index; the session is not
    /// touched.
    pub fn mo_info(&self, index: usize) -> Result<&MolecularOrbital, EngineError> {
        self.orbitals
            .get(index)
            .ok_or(EngineError::OrbitalNotFound { index })
    }

    /// Overrides an orbital's occupation. Density fields generated before the
    /// edit are invalidated.
    ///
    /// # Errors
    ///
    /// Fails with `OrbitalNotFound` for an unknown index and
    /// `InvalidArgument` for a non-finite occupation; state is preserved.
    pub fn set_mo_occupation(&mut self, index: usize, occupation: f64) -> Result<(), EngineError> {
        if !occupation.is_finite() {
            return Err(EngineError::invalid_argument(
                "occupation must be a finite number",
            ));
        }
        let orbital = self
            .orbitals
            .get_mut(index)
            .ok_or(EngineError::OrbitalNotFound { index })?;
        orbital.occupation = occupation;
        self.molecule.bump_revision();
        self.cache.purge_stale(self.molecule.revision());
        Ok(())
    }

    /// The index of the highest occupied orbital of `spin`, in file order.
    pub fn homo(&self, spin: Spin) -> Option<usize> {
        self.orbitals.homo(spin)
    }

    /// The index of the first unoccupied orbital, in file order.
    pub fn lumo(&self) -> Option<usize> {
        self.orbitals.lumo()
    }

    // --- Cubemap generation ----------------------------------------------

    /// Pins the sampling grid to an explicit per-axis resolution; it stays
    /// pinned until cleared.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for a zero count on any axis.
    pub fn set_cubemap_resolution(&mut self, x: usize, y: usize, z: usize) -> Result<(), EngineError> {
        if x == 0 || y == 0 || z == 0 {
            return Err(EngineError::invalid_argument(
                "cubemap resolution must be positive on every axis",
            ));
        }
        self.cubemap_resolution = Some([x, y, z]);
        Ok(())
    }

    /// Returns grid derivation to the density-based default.
    pub fn clear_cubemap_resolution(&mut self) {
        self.cubemap_resolution = None;
    }

    pub fn cubemap_resolution(&self) -> Option<[usize; 3]> {
        self.cubemap_resolution
    }

    /// Generates (or retrieves from cache) the scalar field for `target` and
    /// makes it the current field.
    pub fn generate_cubemap(&mut self, target: FieldTarget) -> Result<Arc<ScalarField>, EngineError> {
        self.generate_cubemap_with(target, &ProgressReporter::new(), &CancelToken::new())
    }

    /// Like [`Session::generate_cubemap`] with progress and cancellation.
    ///
    /// # Errors
    ///
    /// Fails with `OrbitalNotFound` for an out-of-range orbital target,
    /// `InvalidArgument` for an empty model, `ResourceExceeded` beyond the
    /// memory ceiling, and `Cancelled` on a set token.
    pub fn generate_cubemap_with(
        &mut self,
        target: FieldTarget,
        reporter: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Arc<ScalarField>, EngineError> {
        let spec = match self.cubemap_resolution {
            Some(dims) => GridSpec::with_resolution(
                &self.molecule,
                self.settings.cubemap_clearance,
                dims,
            )?,
            None => GridSpec::derive(
                &self.molecule,
                self.settings.cubemap_clearance,
                self.settings.cubemap_density,
            )?,
        };

        let key = FieldKey {
            target,
            resolution: spec.dims,
            revision: self.molecule.revision(),
        };
        if let Some(field) = self.cache.get(&key) {
            info!(?target, "Cubemap served from cache");
            self.current_field = Some(field.clone());
            return Ok(field);
        }

        let field = Arc::new(cubemap::generate(
            &self.basis,
            &self.orbitals,
            target,
            &spec,
            self.settings.cubemap_use_gpu,
            self.settings.cubemap_slice_count,
            self.memory_ceiling,
            reporter,
            cancel,
        )?);
        self.cache.insert(key, field.clone());
        self.cache.purge_stale(self.molecule.revision());
        self.current_field = Some(field.clone());
        Ok(field)
    }

    /// The field rendered by [`Session::render`], if any.
    pub fn current_field(&self) -> Option<&Arc<ScalarField>> {
        self.current_field.as_ref()
    }

    // --- Display properties ----------------------------------------------

    /// Overrides an element's display color and surface parameters.
    ///
    /// # Errors
    ///
    /// Fails with `ElementNotFound` beyond the element table.
    pub fn set_element_properties(
        &mut self,
        atomic_number: u32,
        properties: ElementProperties,
    ) -> Result<(), EngineError> {
        if self.elements.set(atomic_number, properties) {
            Ok(())
        } else {
            Err(EngineError::ElementNotFound { atomic_number })
        }
    }

    /// The current display properties of an element.
    ///
    /// # Errors
    ///
    /// Fails with `ElementNotFound` beyond the element table.
    pub fn element_properties(&self, atomic_number: u32) -> Result<&ElementProperties, EngineError> {
        self.elements
            .get(atomic_number)
            .ok_or(EngineError::ElementNotFound { atomic_number })
    }

    /// Overrides one element's covalent radius for bond inference. Takes
    /// effect on the next rebuild.
    ///
    /// # Errors
    ///
    /// Fails with `ElementNotFound` beyond the element table.
    pub fn set_covalent_radius(&mut self, atomic_number: u32, radius: f64) -> Result<(), EngineError> {
        if (atomic_number as usize) >= crate::core::data::elements::ELEMENT_COUNT {
            return Err(EngineError::ElementNotFound { atomic_number });
        }
        self.radii.set_radius(atomic_number, radius);
        Ok(())
    }

    /// Replaces the covalent radius table with defaults plus the CSV
    /// overrides at `path`.
    pub fn load_covalent_radii<P: AsRef<Path>>(&mut self, path: P) -> Result<(), EngineError> {
        self.radii = CovalentRadiusTable::load_overrides(path.as_ref())?;
        Ok(())
    }

    // --- Camera and settings ---------------------------------------------

    /// Places the camera. The direction is normalized on set.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for a zero direction.
    pub fn set_camera(
        &mut self,
        position: Point3<f64>,
        direction: Vector3<f64>,
    ) -> Result<(), EngineError> {
        self.camera = Camera::new(position, direction)
            .ok_or_else(|| EngineError::invalid_argument("camera direction must be non-zero"))?;
        Ok(())
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replaces the settings record atomically after validating the whole of
    /// it. Geometry-affecting fields do not retroactively rebuild bonds;
    /// callers rebuild explicitly.
    ///
    /// # Errors
    ///
    /// Fails with the first settings violation; the previous record stays in
    /// effect.
    pub fn update_settings(&mut self, settings: RenderSettings) -> Result<(), EngineError> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    // --- Rendering -------------------------------------------------------

    /// Renders one frame of the model, with isosurface and volumetric passes
    /// when a field is present.
    pub fn render(&self, width: u32, height: u32) -> Result<Framebuffer, EngineError> {
        self.render_with(width, height, &ProgressReporter::new(), &CancelToken::new())
    }

    /// Like [`Session::render`] with progress and cancellation.
    pub fn render_with(
        &self,
        width: u32,
        height: u32,
        reporter: &ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<Framebuffer, EngineError> {
        let materials = self.elements.materials();
        let inputs = FrameInputs {
            molecule: &self.molecule,
            materials: &materials,
            settings: &self.settings,
            camera: &self.camera,
            field: self.current_field.as_deref(),
        };
        frame::render(&inputs, width, height, reporter, cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TOLERANCE: f64 = 1e-10;

    fn loaded_session() -> Session {
        let text = "[Molden Format]\n\
             [Atoms] Angs\n\
             O 1 8 0.0 0.0 0.0\n\
             H 2 1 0.0 0.0 0.96\n\
             [GTO]\n\
             1 0\n\
             s 1 1.00\n\
             1.0 1.0\n\
             \n\
             2 0\n\
             s 1 1.00\n\
             0.5 1.0\n\
             \n\
             [MO]\n\
             Sym= A1\n\
             Ene= -0.5\n\
             Spin= Alpha\n\
             Occup= 2.0\n\
             1 0.9\n\
             2 0.3\n\
             Sym= A1\n\
             Ene= 0.2\n\
             Spin= Alpha\n\
             Occup= 0.0\n\
             1 0.3\n\
             2 -0.9\n";
        let mut session = Session::new();
        session.load_molden(&mut Cursor::new(text)).unwrap();
        session
    }

    #[test]
    fn loading_rebuilds_bonds_and_clears_derived_state() {
        let mut session = loaded_session();
        assert_eq!(session.atom_count(), 2);
        assert!(session.bonds().contains(&(0, 1)));

        session.set_cubemap_resolution(5, 5, 5).unwrap();
        session.generate_cubemap(FieldTarget::Orbital(0)).unwrap();
        assert!(session.current_field().is_some());

        let text = "1\ncomment\nHe 0.0 0.0 0.0\n";
        session.load_xyz(&mut Cursor::new(text)).unwrap();
        assert_eq!(session.atom_count(), 1);
        assert_eq!(session.mo_count(), 0);
        assert!(session.current_field().is_none());
        assert!(session.bonds().is_empty());
    }

    #[test]
    fn atom_lookup_reports_unknown_indices() {
        let session = loaded_session();
        assert_eq!(session.atom(0).unwrap().atomic_number, 8);
        assert!(matches!(
            session.atom(7),
            Err(EngineError::AtomNotFound { index: 7 })
        ));
    }

    #[test]
    fn transform_carries_atoms_and_basis_centers() {
        let mut session = loaded_session();
        // A third, off-axis atom so the references span a frame.
        session.add_atom(1, Point3::new(0.9, 0.0, -0.3));
        let revision_before = session.revision();

        let position = Point3::new(5.0, -2.0, 1.0);
        let dir01 = Vector3::new(0.0, 1.0, 0.0);
        let dir02 = Vector3::new(-1.0, 0.0, 0.0);
        session
            .set_transform([0, 1, 2], position, dir01, dir02)
            .unwrap();

        let frame = session.transform_frame([0, 1, 2]).unwrap();
        assert!((frame.anchor - position).norm() < TOLERANCE);
        assert!((frame.u.into_inner() - dir01).norm() < TOLERANCE);
        assert!((frame.v.into_inner() - dir02).norm() < TOLERANCE);

        assert!((session.atom(0).unwrap().position - position).norm() < TOLERANCE);
        // Interatomic distance is preserved by the rigid map.
        let d = (session.atom(1).unwrap().position - session.atom(0).unwrap().position).norm();
        assert!((d - 0.96).abs() < TOLERANCE);
        assert!(session.revision() > revision_before);
    }

    #[test]
    fn degenerate_transforms_change_nothing() {
        let mut session = loaded_session();
        session.add_atom(1, Point3::new(0.9, 0.0, -0.3));
        let before = session.atom(1).unwrap().position;

        // Parallel target directions.
        let d = Vector3::new(1.0, 0.0, 0.0);
        assert!(matches!(
            session.set_transform([0, 1, 2], Point3::origin(), d, 2.0 * d),
            Err(EngineError::InvalidArgument { .. })
        ));
        assert!(matches!(
            session.set_transform([0, 1, 9], Point3::origin(), d, Vector3::new(0.0, 1.0, 0.0)),
            Err(EngineError::AtomNotFound { index: 9 })
        ));
        assert_eq!(session.atom(1).unwrap().position, before);
    }

    #[test]
    fn orbital_queries_and_edits() {
        let mut session = loaded_session();
        assert_eq!(session.mo_count(), 2);
        assert_eq!(session.mo_info(0).unwrap().label, "A1");
        assert_eq!(session.homo(Spin::Alpha), Some(0));
        assert_eq!(session.lumo(), Some(1));

        session.set_mo_occupation(1, 1.0).unwrap();
        assert!((session.mo_info(1).unwrap().occupation - 1.0).abs() < TOLERANCE);
        assert_eq!(session.lumo(), None);
    }

    #[test]
    fn bad_occupation_edits_preserve_state() {
        let mut session = loaded_session();
        assert!(matches!(
            session.set_mo_occupation(5, 1.0),
            Err(EngineError::OrbitalNotFound { index: 5 })
        ));
        assert!(matches!(
            session.set_mo_occupation(0, f64::NAN),
            Err(EngineError::InvalidArgument { .. })
        ));
        assert!((session.mo_info(0).unwrap().occupation - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn cubemap_results_are_cached_per_revision() {
        let mut session = loaded_session();
        session.set_cubemap_resolution(6, 6, 6).unwrap();

        let first = session.generate_cubemap(FieldTarget::Orbital(0)).unwrap();
        let second = session.generate_cubemap(FieldTarget::Orbital(0)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // A geometry edit invalidates the cache.
        session.set_mo_occupation(0, 1.0).unwrap();
        let third = session.generate_cubemap(FieldTarget::Orbital(0)).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn resolution_override_sticks_until_cleared() {
        let mut session = loaded_session();
        session.set_cubemap_resolution(5, 6, 7).unwrap();
        let field = session.generate_cubemap(FieldTarget::Density).unwrap();
        assert_eq!(field.dims(), [5, 6, 7]);

        session.clear_cubemap_resolution();
        assert_eq!(session.cubemap_resolution(), None);

        assert!(matches!(
            session.set_cubemap_resolution(0, 4, 4),
            Err(EngineError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn generation_respects_the_memory_ceiling() {
        let mut session = loaded_session();
        session.set_cubemap_resolution(16, 16, 16).unwrap();
        session.set_memory_ceiling(64);
        assert!(matches!(
            session.generate_cubemap(FieldTarget::Density),
            Err(EngineError::ResourceExceeded { .. })
        ));
    }

    #[test]
    fn cancelled_generation_aborts() {
        let mut session = loaded_session();
        session.set_cubemap_resolution(6, 6, 6).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let result = session.generate_cubemap_with(
            FieldTarget::Orbital(0),
            &ProgressReporter::new(),
            &token,
        );
        assert!(matches!(result, Err(EngineError::Cancelled)));
        assert!(session.current_field().is_none());
    }

    #[test]
    fn element_property_overrides_round_trip() {
        let mut session = Session::new();
        let mut props = ElementProperties::default_for(6);
        props.color = [0.1, 0.2, 0.3];
        session.set_element_properties(6, props).unwrap();
        assert_eq!(session.element_properties(6).unwrap().color, [0.1, 0.2, 0.3]);

        assert!(matches!(
            session.set_element_properties(500, props),
            Err(EngineError::ElementNotFound { atomic_number: 500 })
        ));
        assert!(matches!(
            session.element_properties(500),
            Err(EngineError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn covalent_radius_overrides_affect_the_next_rebuild() {
        let mut session = Session::new();
        session.add_atom(1, Point3::origin());
        session.add_atom(1, Point3::new(1.5, 0.0, 0.0));
        session.rebuild_bonds();
        assert!(session.bonds().is_empty());

        session.set_covalent_radius(1, 0.8).unwrap();
        session.rebuild_bonds();
        assert!(session.bonds().contains(&(0, 1)));

        assert!(matches!(
            session.set_covalent_radius(999, 0.8),
            Err(EngineError::ElementNotFound { .. })
        ));
    }

    #[test]
    fn camera_reads_back_as_set() {
        let mut session = Session::new();
        session
            .set_camera(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, -4.0))
            .unwrap();
        let camera = session.camera();
        assert_eq!(camera.position, Point3::new(1.0, 2.0, 3.0));
        assert!((camera.direction.into_inner() - Vector3::new(0.0, 0.0, -1.0)).norm() < TOLERANCE);

        assert!(matches!(
            session.set_camera(Point3::origin(), Vector3::zeros()),
            Err(EngineError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn invalid_settings_change_nothing() {
        let mut session = Session::new();
        let mut bad = RenderSettings::default();
        bad.fov = -10.0;
        bad.size_factor = 0.5;
        assert!(session.update_settings(bad).is_err());
        assert!((session.settings().fov - 70.0).abs() < TOLERANCE);
        assert!((session.settings().size_factor - 0.2).abs() < TOLERANCE);

        let mut good = RenderSettings::default();
        good.size_factor = 0.5;
        session.update_settings(good).unwrap();
        assert!((session.settings().size_factor - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn rendering_survives_out_of_table_atomic_numbers() {
        let mut session = Session::new();
        session.add_atom(500, Point3::origin());
        let frame = session.render(4, 4).unwrap();
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 4);
    }

    #[test]
    fn empty_sessions_render_the_clear_color() {
        let session = Session::new();
        let frame = session.render(4, 4).unwrap();
        let [r, g, b, a] = frame.color_at(2, 2);
        assert_eq!([r, g, b], session.settings().clear_color);
        assert_eq!(a, 0.0);
    }
}
