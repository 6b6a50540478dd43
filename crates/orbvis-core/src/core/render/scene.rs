use super::camera::Ray;
use super::intersect::{ray_capsule, ray_cylinder, ray_sphere, SurfaceHit};
use super::shading::Material;
use crate::core::data::elements;
use crate::core::models::molecule::Molecule;
use nalgebra::{Point3, Unit, Vector3};

/// Ball-and-stick sizing, lifted out of the full settings record so the scene
/// builder stays independent of the engine layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryStyle {
    /// Atom spheres use `vdw_radius · size_factor` (ghosts a flat
    /// `0.5 · size_factor`).
    pub size_factor: f64,
    pub bond_thickness: f64,
    /// Capsule bonds instead of open cylinders.
    pub smooth_bonds: bool,
}

/// Material for an atomic number, with the ghost entry covering anything a
/// file declared past the element table.
fn material_for(materials: &[Material], atomic_number: u32) -> Material {
    let index = atomic_number as usize;
    if index < materials.len() {
        materials[index]
    } else {
        materials[0]
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SceneSphere {
    center: Point3<f64>,
    radius: f64,
    material: Material,
}

/// Half of a bond: the segment from one atom to the bond midpoint, carrying
/// that atom's material.
#[derive(Debug, Clone, PartialEq)]
struct SceneBond {
    start: Point3<f64>,
    end: Point3<f64>,
    radius: f64,
    capsule: bool,
    material: Material,
}

/// The solid geometry of one frame: atom spheres and half-bond primitives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    spheres: Vec<SceneSphere>,
    bonds: Vec<SceneBond>,
}

impl Scene {
    /// Assembles the scene from the model. `materials` is indexed by atomic
    /// number; atomic numbers past the table take the ghost entry, matching
    /// the element table fallback.
    pub fn build(molecule: &Molecule, materials: &[Material], style: &GeometryStyle) -> Self {
        let mut scene = Scene::default();

        for (_, atom) in molecule.atoms() {
            let radius = if atom.is_ghost() {
                0.5 * style.size_factor
            } else {
                elements::vdw_radius(atom.atomic_number) * style.size_factor
            };
            scene.spheres.push(SceneSphere {
                center: atom.position,
                radius,
                material: material_for(materials, atom.atomic_number),
            });
        }

        for &(a, b) in molecule.bonds() {
            let (first, second) = match (molecule.atom(a), molecule.atom(b)) {
                (Some(first), Some(second)) => (first, second),
                _ => continue,
            };
            let midpoint = Point3::from((first.position.coords + second.position.coords) * 0.5);
            scene.bonds.push(SceneBond {
                start: first.position,
                end: midpoint,
                radius: style.bond_thickness,
                capsule: style.smooth_bonds,
                material: material_for(materials, first.atomic_number),
            });
            scene.bonds.push(SceneBond {
                start: midpoint,
                end: second.position,
                radius: style.bond_thickness,
                capsule: style.smooth_bonds,
                material: material_for(materials, second.atomic_number),
            });
        }

        scene
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty() && self.bonds.is_empty()
    }

    /// The nearest solid hit along a ray, with its material.
    pub fn nearest_hit(&self, ray: &Ray) -> Option<(SurfaceHit, &Material)> {
        let mut best: Option<(SurfaceHit, &Material)> = None;

        for sphere in &self.spheres {
            if let Some(hit) = ray_sphere(ray, &sphere.center, sphere.radius) {
                if best.as_ref().map_or(true, |(current, _)| hit.t < current.t) {
                    best = Some((hit, &sphere.material));
                }
            }
        }
        for bond in &self.bonds {
            let hit = if bond.capsule {
                ray_capsule(ray, &bond.start, &bond.end, bond.radius)
            } else {
                ray_cylinder(ray, &bond.start, &bond.end, bond.radius)
            };
            if let Some(hit) = hit {
                if best.as_ref().map_or(true, |(current, _)| hit.t < current.t) {
                    best = Some((hit, &bond.material));
                }
            }
        }
        best
    }

    /// Whether any solid geometry blocks the segment from `origin` along
    /// `direction` within `max_distance`.
    pub fn occluded(
        &self,
        origin: &Point3<f64>,
        direction: &Unit<Vector3<f64>>,
        max_distance: f64,
    ) -> bool {
        let ray = Ray::new(*origin, *direction);
        for sphere in &self.spheres {
            if let Some(hit) = ray_sphere(&ray, &sphere.center, sphere.radius) {
                if hit.t < max_distance {
                    return true;
                }
            }
        }
        for bond in &self.bonds {
            let hit = if bond.capsule {
                ray_capsule(&ray, &bond.start, &bond.end, bond.radius)
            } else {
                ray_cylinder(&ray, &bond.start, &bond.end, bond.radius)
            };
            if let Some(hit) = hit {
                if hit.t < max_distance {
                    return true;
                }
            }
        }
        false
    }
}
