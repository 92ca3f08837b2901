//! Built-in STL backend.
//!
//! Handles STL meshes without any external tool. A "shape" here is the
//! welded, faceted form of a mesh: vertices closer than the tolerance are
//! merged and triangles that collapse are dropped. Exact B-rep formats
//! (STEP, IGES, BREP) are not available from this backend.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use stl_io::IndexedMesh;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{KernelError, KernelResult};
use crate::traits::{GeometryKernel, MeshHandle, ShapeHandle};

const NAME: &str = "native";

struct StoredMesh {
    source: PathBuf,
    mesh: IndexedMesh,
}

/// Welded triangle surface built from a mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetedShape {
    /// Unique vertex positions.
    pub vertices: Vec<[f32; 3]>,
    /// Triangles as indices into `vertices`.
    pub facets: Vec<[u32; 3]>,
}

impl FacetedShape {
    /// Weld `mesh` within `tolerance` and drop degenerate facets.
    ///
    /// A vertex merges into the nearest earlier vertex at most `tolerance`
    /// away. Candidates come from a grid of `tolerance`-sized cells: the
    /// vertex's own cell and its 26 neighbours.
    pub fn from_mesh(mesh: &IndexedMesh, tolerance: f64) -> Self {
        let mut shape = Self::default();
        let mut grid: HashMap<[i64; 3], Vec<u32>> = HashMap::new();

        let mut weld = |v: [f32; 3], shape: &mut Self| -> u32 {
            let cell = v.map(|c| (f64::from(c) / tolerance).floor() as i64);
            let nearest = neighbour_cells(cell)
                .filter_map(|key| grid.get(&key))
                .flatten()
                .map(|&idx| (idx, distance(shape.vertices[idx as usize], v)))
                .filter(|&(_, d)| d <= tolerance)
                .min_by(|a, b| a.1.total_cmp(&b.1));

            match nearest {
                Some((idx, _)) => idx,
                None => {
                    let idx = shape.vertices.len() as u32;
                    shape.vertices.push(v);
                    grid.entry(cell).or_default().push(idx);
                    idx
                }
            }
        };

        for face in &mesh.faces {
            let [a, b, c] = face.vertices.map(|idx| {
                let p = mesh.vertices[idx];
                weld([p[0], p[1], p[2]], &mut shape)
            });
            if a != b && b != c && a != c {
                shape.facets.push([a, b, c]);
            }
        }

        shape
    }

    fn triangles(&self) -> Vec<stl_io::Triangle> {
        self.facets
            .iter()
            .map(|&[a, b, c]| {
                let v0 = self.vertices[a as usize];
                let v1 = self.vertices[b as usize];
                let v2 = self.vertices[c as usize];
                stl_io::Triangle {
                    normal: stl_io::Normal::new(facet_normal(v0, v1, v2)),
                    vertices: [
                        stl_io::Vertex::new(v0),
                        stl_io::Vertex::new(v1),
                        stl_io::Vertex::new(v2),
                    ],
                }
            })
            .collect()
    }
}

fn neighbour_cells(cell: [i64; 3]) -> impl Iterator<Item = [i64; 3]> {
    (-1..=1).flat_map(move |dx| {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).map(move |dz| [cell[0] + dx, cell[1] + dy, cell[2] + dz])
        })
    })
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f64 {
    a.iter()
        .zip(&b)
        .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn facet_normal(v0: [f32; 3], v1: [f32; 3], v2: [f32; 3]) -> [f32; 3] {
    let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
    let cross = [
        e1[1] * e2[2] - e1[2] * e2[1],
        e1[2] * e2[0] - e1[0] * e2[2],
        e1[0] * e2[1] - e1[1] * e2[0],
    ];
    let len = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
    if len > 0.0 {
        cross.map(|c| c / len)
    } else {
        [0.0, 0.0, 1.0]
    }
}

fn is_stl(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("stl"))
}

fn write_triangles(path: &Path, triangles: &[stl_io::Triangle]) -> KernelResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    stl_io::write_stl(&mut writer, triangles.iter())?;
    writer.flush()?;
    Ok(())
}

/// Pure Rust kernel for STL meshes.
#[derive(Default)]
pub struct NativeKernel {
    meshes: Mutex<HashMap<Uuid, StoredMesh>>,
    shapes: Mutex<HashMap<Uuid, FacetedShape>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NativeKernel {
    /// Create an empty kernel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the faceted shape behind a handle.
    pub fn shape(&self, shape: &ShapeHandle) -> KernelResult<FacetedShape> {
        lock(&self.shapes)
            .get(&shape.id())
            .cloned()
            .ok_or(KernelError::HandleNotFound { id: shape.id() })
    }
}

#[async_trait]
impl GeometryKernel for NativeKernel {
    fn name(&self) -> &str {
        NAME
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn load_mesh(&self, path: &Path) -> KernelResult<MeshHandle> {
        if !path.is_file() {
            return Err(KernelError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        if !is_stl(path) {
            return Err(KernelError::unsupported(NAME, "reading non-STL meshes"));
        }

        let mut reader = BufReader::new(File::open(path)?);
        let mesh = stl_io::read_stl(&mut reader).map_err(|e| KernelError::MeshRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(
            path = %path.display(),
            vertices = mesh.vertices.len(),
            faces = mesh.faces.len(),
            "Mesh loaded"
        );

        let handle = MeshHandle::new(path);
        lock(&self.meshes).insert(
            handle.id(),
            StoredMesh {
                source: path.to_path_buf(),
                mesh,
            },
        );
        Ok(handle)
    }

    async fn export_mesh(&self, mesh: &MeshHandle, path: &Path) -> KernelResult<()> {
        if !is_stl(path) {
            return Err(KernelError::unsupported(NAME, "writing non-STL meshes"));
        }

        let triangles: Vec<stl_io::Triangle> = {
            let meshes = lock(&self.meshes);
            let stored = meshes
                .get(&mesh.id())
                .ok_or(KernelError::HandleNotFound { id: mesh.id() })?;
            stored
                .mesh
                .faces
                .iter()
                .map(|face| stl_io::Triangle {
                    normal: face.normal,
                    vertices: face.vertices.map(|idx| stored.mesh.vertices[idx]),
                })
                .collect()
        };

        write_triangles(path, &triangles)?;
        info!(output = %path.display(), facets = triangles.len(), "Mesh written");
        Ok(())
    }

    async fn shape_from_mesh(
        &self,
        mesh: &MeshHandle,
        tolerance: f64,
    ) -> KernelResult<ShapeHandle> {
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(KernelError::InvalidArgument(format!(
                "tolerance must be positive, got {tolerance}"
            )));
        }

        let shape = {
            let meshes = lock(&self.meshes);
            let stored = meshes
                .get(&mesh.id())
                .ok_or(KernelError::HandleNotFound { id: mesh.id() })?;
            let shape = FacetedShape::from_mesh(&stored.mesh, tolerance);
            if shape.facets.is_empty() {
                return Err(KernelError::EmptyMesh {
                    path: stored.source.clone(),
                });
            }
            shape
        };

        debug!(
            vertices = shape.vertices.len(),
            facets = shape.facets.len(),
            tolerance,
            "Shape built from mesh"
        );
        let handle = ShapeHandle::from_mesh(mesh);
        lock(&self.shapes).insert(handle.id(), shape);
        Ok(handle)
    }

    async fn read_shape(&self, _path: &Path) -> KernelResult<ShapeHandle> {
        Err(KernelError::unsupported(NAME, "reading STEP/IGES/BREP files"))
    }

    async fn export_step(&self, _shape: &ShapeHandle, _path: &Path) -> KernelResult<()> {
        Err(KernelError::unsupported(NAME, "STEP export"))
    }

    async fn export_iges(&self, _shape: &ShapeHandle, _path: &Path) -> KernelResult<()> {
        Err(KernelError::unsupported(NAME, "IGES export"))
    }

    async fn export_brep(&self, _shape: &ShapeHandle, _path: &Path) -> KernelResult<()> {
        Err(KernelError::unsupported(NAME, "BREP export"))
    }

    // Shapes are already faceted, so the tessellation tolerance has no effect.
    async fn export_stl(
        &self,
        shape: &ShapeHandle,
        path: &Path,
        _tolerance: f64,
    ) -> KernelResult<()> {
        let triangles = self.shape(shape)?.triangles();
        write_triangles(path, &triangles)?;
        info!(output = %path.display(), facets = triangles.len(), "Shape tessellated to STL");
        Ok(())
    }

    fn release(&self, id: Uuid) {
        lock(&self.meshes).remove(&id);
        lock(&self.shapes).remove(&id);
    }
}
