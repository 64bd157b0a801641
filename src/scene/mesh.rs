use crate::core::geometry::Face;
use crate::io::geometry_parser::{ParseError, ParsedGeometry, parse_geometry, parse_reader};
use crate::scene::normals::generate_normals;
use log::{debug, info};
use nalgebra::{Point3, Vector3};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Why a mesh could not be built. No partially built mesh is ever returned.
#[derive(Debug)]
pub enum MeshError {
    Io(std::io::Error),
    Parse(ParseError),
    /// A face refers to a vertex that was never declared.
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::Io(e) => write!(f, "failed to read geometry: {e}"),
            MeshError::Parse(e) => write!(f, "malformed geometry at {e}"),
            MeshError::IndexOutOfRange {
                face,
                index,
                vertex_count,
            } => write!(
                f,
                "face {face} references vertex {} but only {vertex_count} are declared",
                index + 1
            ),
        }
    }
}

impl std::error::Error for MeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MeshError::Io(e) => Some(e),
            MeshError::Parse(e) => Some(e),
            MeshError::IndexOutOfRange { .. } => None,
        }
    }
}

impl From<std::io::Error> for MeshError {
    fn from(e: std::io::Error) -> Self {
        MeshError::Io(e)
    }
}

impl From<ParseError> for MeshError {
    fn from(e: ParseError) -> Self {
        MeshError::Parse(e)
    }
}

/// Vertex positions, per-vertex normals and triangles of one renderable object.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Point3<f32>>,
    /// Either empty or one entry per position.
    pub normals: Vec<Vector3<f32>>,
    pub faces: Vec<Face>,
}

impl Mesh {
    /// Builds a mesh from raw lists.
    ///
    /// Face indices are validated. Normals are generated only when `normals`
    /// is empty; supplied normals, even partial ones, are kept untouched.
    pub fn new(
        positions: Vec<Point3<f32>>,
        normals: Vec<Vector3<f32>>,
        faces: Vec<Face>,
    ) -> Result<Self, MeshError> {
        validate_faces(&positions, &faces)?;

        let normals = if normals.is_empty() {
            debug!("Generating normals for {} vertices", positions.len());
            generate_normals(&positions, &faces)
        } else {
            normals
        };

        Ok(Self {
            positions,
            normals,
            faces,
        })
    }

    /// Loads and finalizes a mesh from a geometry file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        let path = path.as_ref();
        info!("Loading geometry file: {}", path.display());

        let reader = BufReader::new(File::open(path)?);
        let mesh = Self::from_parsed(parse_reader(reader)?)?;

        info!(
            "Geometry loaded. Vertices: {}, Faces: {}",
            mesh.positions.len(),
            mesh.faces.len()
        );
        Ok(mesh)
    }

    /// Same as [`Mesh::load`] for an in-memory source.
    pub fn from_source(source: &str) -> Result<Self, MeshError> {
        Self::from_parsed(parse_geometry(source)?)
    }

    fn from_parsed(parsed: ParsedGeometry) -> Result<Self, MeshError> {
        // The format carries no normal records, so generation always runs here.
        Self::new(parsed.positions, Vec::new(), parsed.faces)
    }

    /// A mesh is worth uploading once it has at least one vertex.
    pub fn is_ready(&self) -> bool {
        !self.positions.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Face indices flattened into an index-buffer layout.
    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flat_map(|f| f.indices).collect()
    }
}

fn validate_faces(positions: &[Point3<f32>], faces: &[Face]) -> Result<(), MeshError> {
    let vertex_count = positions.len();
    for (face_number, face) in faces.iter().enumerate() {
        let index = face.max_index();
        if index as usize >= vertex_count {
            return Err(MeshError::IndexOutOfRange {
                face: face_number,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}
