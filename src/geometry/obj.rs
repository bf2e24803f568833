//! Wavefront OBJ dump of emitted geometry (debugging aid)

use std::fmt::Write as _;
use std::path::Path;

use crate::error::ArenaError;

use super::sink::GeometrySink;
use super::GeometryNode;

/// Accumulates nodes as OBJ text; one `o` object per node.
#[derive(Debug, Default)]
pub struct ObjWriter {
    text: String,
    vertex_offset: u32,
    objects: usize,
}

impl ObjWriter {
    pub fn new() -> Self {
        let mut text = String::new();
        text.push_str("# arena_generator OBJ dump\n");
        Self {
            text,
            vertex_offset: 0,
            objects: 0,
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArenaError> {
        std::fs::write(path, &self.text)?;
        Ok(())
    }
}

impl GeometrySink for ObjWriter {
    fn add_node(&mut self, node: &GeometryNode) {
        let mesh = &node.mesh;
        if mesh.is_empty() {
            return;
        }
        // Writing into a String cannot fail
        let _ = writeln!(self.text, "o {}", node.name);
        if let Some((lo, hi)) = mesh.bounds() {
            let _ = writeln!(self.text, "# bounds {:.3} {:.3} {:.3} / {:.3} {:.3} {:.3}", lo.x, lo.y, lo.z, hi.x, hi.y, hi.z);
        }
        for p in &mesh.positions {
            let _ = writeln!(self.text, "v {:.5} {:.5} {:.5}", p.x, p.y, p.z);
        }
        for uv in &mesh.uvs {
            let _ = writeln!(self.text, "vt {:.5} {:.5}", uv.x, uv.y);
        }
        for n in &mesh.normals {
            let _ = writeln!(self.text, "vn {:.5} {:.5} {:.5}", n.x, n.y, n.z);
        }
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| i + self.vertex_offset + 1);
            let _ = writeln!(self.text, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}");
        }
        self.vertex_offset += mesh.vertex_count() as u32;
        self.objects += 1;
    }
}
