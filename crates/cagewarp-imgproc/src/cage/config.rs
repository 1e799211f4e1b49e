use cagewarp_image::Rect;
use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::error::CageError;

/// The serialized form of a cage: its source outline and, optionally, the
/// deformed outline. Derived quantities are recomputed on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CageOutline {
    /// Source outline, in image coordinates.
    pub vertices: Vec<DVec2>,
    /// Deformed outline; the source outline when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deformed: Option<Vec<DVec2>>,
}

/// A closed polygon with a source and a deformed position per vertex.
///
/// Alongside the two outlines the configuration keeps, per vertex `i`, the
/// quantities of the edge `i -> i + 1`:
///
/// * the outward unit normal of the source edge,
/// * the outward unit normal of the deformed edge,
/// * the scaling factor, deformed edge length over source edge length.
///
/// "Outward" is decided by the winding of the source outline.
///
/// # Example
///
/// ```
/// use cagewarp_imgproc::cage::CageConfig;
/// use glam::DVec2;
///
/// let mut cage = CageConfig::new(vec![
///     DVec2::new(0.0, 0.0),
///     DVec2::new(10.0, 0.0),
///     DVec2::new(10.0, 10.0),
///     DVec2::new(0.0, 10.0),
/// ]).unwrap();
///
/// cage.move_deformed_vertex(2, DVec2::new(20.0, 20.0)).unwrap();
///
/// assert!(cage.point_inside(5.0, 5.0));
/// assert_eq!(cage.bounding_box().width, 11);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CageOutline", into = "CageOutline")]
pub struct CageConfig {
    vertices: Vec<DVec2>,
    vertices_d: Vec<DVec2>,
    normals: Vec<DVec2>,
    normals_d: Vec<DVec2>,
    scaling_factor: Vec<f64>,
    orientation: f64,
}

impl CageConfig {
    /// Create a cage whose deformed outline equals the source outline.
    ///
    /// # Errors
    ///
    /// Fails with less than three vertices, non finite coordinates or two
    /// consecutive identical vertices.
    pub fn new(vertices: Vec<DVec2>) -> Result<Self, CageError> {
        let vertices_d = vertices.clone();
        Self::with_deformed(vertices, vertices_d)
    }

    /// Create a cage from a source and a deformed outline.
    ///
    /// # Errors
    ///
    /// Same as [`CageConfig::new`], and the two outlines must have the same length.
    pub fn with_deformed(vertices: Vec<DVec2>, vertices_d: Vec<DVec2>) -> Result<Self, CageError> {
        if vertices.len() < 3 {
            return Err(CageError::NotEnoughVertices(vertices.len()));
        }
        if vertices.len() != vertices_d.len() {
            return Err(CageError::VertexCountMismatch(
                vertices.len(),
                vertices_d.len(),
            ));
        }
        check_finite(&vertices)?;
        check_finite(&vertices_d)?;

        let n = vertices.len();
        for i in 0..n {
            if vertices[i] == vertices[(i + 1) % n] {
                return Err(CageError::DegenerateEdge(i));
            }
        }

        let orientation = if signed_area(&vertices) < 0.0 { -1.0 } else { 1.0 };
        let normals = edge_normals(&vertices, orientation);

        let mut cage = Self {
            vertices,
            vertices_d,
            normals,
            normals_d: Vec::new(),
            scaling_factor: Vec::new(),
            orientation,
        };
        cage.update_deformed();

        Ok(cage)
    }

    /// Number of vertices of the cage.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Source outline.
    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    /// Deformed outline.
    pub fn vertices_d(&self) -> &[DVec2] {
        &self.vertices_d
    }

    /// Outward unit normals of the source edges.
    pub fn normals(&self) -> &[DVec2] {
        &self.normals
    }

    /// Outward unit normals of the deformed edges.
    pub fn normals_d(&self) -> &[DVec2] {
        &self.normals_d
    }

    /// Per edge ratio of the deformed length over the source length.
    pub fn scaling_factor(&self) -> &[f64] {
        &self.scaling_factor
    }

    /// Replace the deformed outline.
    ///
    /// # Errors
    ///
    /// The outline must have one finite point per cage vertex.
    pub fn set_deformed(&mut self, vertices_d: Vec<DVec2>) -> Result<(), CageError> {
        if vertices_d.len() != self.vertices.len() {
            return Err(CageError::VertexCountMismatch(
                self.vertices.len(),
                vertices_d.len(),
            ));
        }
        check_finite(&vertices_d)?;

        self.vertices_d = vertices_d;
        self.update_deformed();
        Ok(())
    }

    /// Move one deformed vertex.
    ///
    /// # Errors
    ///
    /// The index must be valid and the position finite.
    pub fn move_deformed_vertex(&mut self, index: usize, position: DVec2) -> Result<(), CageError> {
        if index >= self.vertices_d.len() {
            return Err(CageError::VertexIndexOutOfBounds(
                index,
                self.vertices_d.len(),
            ));
        }
        if !position.is_finite() {
            return Err(CageError::NonFiniteVertex(index));
        }

        self.vertices_d[index] = position;
        self.update_deformed();
        Ok(())
    }

    /// Translate the whole deformed outline.
    ///
    /// # Errors
    ///
    /// Every translated vertex must stay finite; the cage is left unchanged
    /// otherwise.
    pub fn translate_deformed(&mut self, delta: DVec2) -> Result<(), CageError> {
        if let Some(i) = self.vertices_d.iter().position(|v| !(*v + delta).is_finite()) {
            return Err(CageError::NonFiniteVertex(i));
        }

        self.vertices_d.iter_mut().for_each(|v| *v += delta);
        self.update_deformed();
        Ok(())
    }

    /// Make the deformed outline equal to the source outline again.
    pub fn reset_deformed(&mut self) {
        self.vertices_d.clone_from(&self.vertices);
        self.update_deformed();
    }

    /// Integer bounding box of the source outline.
    ///
    /// The box starts at the floor of the smallest coordinates and spans up to
    /// the ceiling of the largest ones, both ends included.
    pub fn bounding_box(&self) -> Rect {
        bounding_box(&self.vertices)
    }

    /// Whether the point lies inside the source outline.
    ///
    /// Even-odd crossing test: points on the left and top edges of an axis
    /// aligned cage are inside, points on its right and bottom edges are not.
    pub fn point_inside(&self, x: f64, y: f64) -> bool {
        let cv = &self.vertices;
        let mut inside = false;

        let mut j = cv.len() - 1;
        for i in 0..cv.len() {
            let (vi, vj) = (cv[i], cv[j]);
            if ((vi.y <= y && y < vj.y) || (vj.y <= y && y < vi.y))
                && x < (vj.x - vi.x) * (y - vi.y) / (vj.y - vi.y) + vi.x
            {
                inside = !inside;
            }
            j = i;
        }

        inside
    }

    fn update_deformed(&mut self) {
        let n = self.vertices.len();
        self.normals_d = edge_normals(&self.vertices_d, self.orientation);
        self.scaling_factor = (0..n)
            .map(|i| {
                let src = self.vertices[(i + 1) % n] - self.vertices[i];
                let dst = self.vertices_d[(i + 1) % n] - self.vertices_d[i];
                dst.length() / src.length()
            })
            .collect();
    }
}

impl TryFrom<CageOutline> for CageConfig {
    type Error = CageError;

    fn try_from(outline: CageOutline) -> Result<Self, Self::Error> {
        match outline.deformed {
            Some(deformed) => Self::with_deformed(outline.vertices, deformed),
            None => Self::new(outline.vertices),
        }
    }
}

impl From<CageConfig> for CageOutline {
    fn from(cage: CageConfig) -> Self {
        Self {
            vertices: cage.vertices,
            deformed: Some(cage.vertices_d),
        }
    }
}

fn check_finite(points: &[DVec2]) -> Result<(), CageError> {
    match points.iter().position(|p| !p.is_finite()) {
        Some(i) => Err(CageError::NonFiniteVertex(i)),
        None => Ok(()),
    }
}

/// Shoelace area, positive when the outline turns from +x towards +y.
fn signed_area(points: &[DVec2]) -> f64 {
    let n = points.len();
    0.5 * (0..n)
        .map(|i| points[i].perp_dot(points[(i + 1) % n]))
        .sum::<f64>()
}

fn edge_normals(points: &[DVec2], orientation: f64) -> Vec<DVec2> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = points[(i + 1) % n] - points[i];
            DVec2::new(a.y, -a.x).normalize_or_zero() * orientation
        })
        .collect()
}

fn bounding_box(points: &[DVec2]) -> Rect {
    let min = points.iter().fold(DVec2::INFINITY, |acc, p| acc.min(*p));
    let max = points.iter().fold(DVec2::NEG_INFINITY, |acc, p| acc.max(*p));

    let x = min.x.floor() as i64;
    let y = min.y.floor() as i64;
    let width = (max.x.ceil() as i64 - x + 1) as usize;
    let height = (max.y.ceil() as i64 - y + 1) as usize;

    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::{CageConfig, CageOutline};
    use crate::cage::CageError;
    use approx::assert_relative_eq;
    use cagewarp_image::Rect;
    use glam::DVec2;

    fn square(size: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(size, 0.0),
            DVec2::new(size, size),
            DVec2::new(0.0, size),
        ]
    }

    #[test]
    fn cage_validation() {
        assert_eq!(
            CageConfig::new(square(1.0)[..2].to_vec()).err(),
            Some(CageError::NotEnoughVertices(2))
        );
        assert_eq!(
            CageConfig::with_deformed(square(1.0), square(1.0)[..3].to_vec()).err(),
            Some(CageError::VertexCountMismatch(4, 3))
        );

        let mut nan = square(1.0);
        nan[1].x = f64::NAN;
        assert_eq!(
            CageConfig::new(nan).err(),
            Some(CageError::NonFiniteVertex(1))
        );

        let mut repeated = square(1.0);
        repeated[2] = repeated[1];
        assert_eq!(
            CageConfig::new(repeated).err(),
            Some(CageError::DegenerateEdge(1))
        );
    }

    #[test]
    fn cage_bounding_box() -> Result<(), CageError> {
        let cage = CageConfig::new(square(10.0))?;
        assert_eq!(cage.bounding_box(), Rect::new(0, 0, 11, 11));

        let cage = CageConfig::new(vec![
            DVec2::new(-1.5, 2.2),
            DVec2::new(4.1, 3.0),
            DVec2::new(0.0, 7.9),
        ])?;
        assert_eq!(cage.bounding_box(), Rect::new(-2, 2, 8, 7));

        Ok(())
    }

    #[test]
    fn cage_point_inside() -> Result<(), CageError> {
        let cage = CageConfig::new(square(10.0))?;
        assert!(cage.point_inside(0.0, 0.0));
        assert!(cage.point_inside(9.0, 9.0));
        assert!(cage.point_inside(5.5, 0.5));
        assert!(!cage.point_inside(10.0, 5.0));
        assert!(!cage.point_inside(5.0, 10.0));
        assert!(!cage.point_inside(-0.5, 5.0));

        let triangle = CageConfig::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(0.0, 10.0),
        ])?;
        assert!(triangle.point_inside(2.0, 2.0));
        assert!(!triangle.point_inside(6.0, 6.0));

        Ok(())
    }

    #[test]
    fn cage_normals_point_outward() -> Result<(), CageError> {
        let expected = [
            DVec2::new(0.0, -1.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(-1.0, 0.0),
        ];

        let cage = CageConfig::new(square(10.0))?;
        assert_eq!(cage.normals(), &expected);
        assert_eq!(cage.normals_d(), &expected);

        // the reversed winding gives the same outward directions
        let mut reversed = square(10.0);
        reversed.reverse();
        let cage = CageConfig::new(reversed)?;
        for n in cage.normals() {
            assert!(expected.contains(n));
        }
        assert_eq!(cage.normals()[0], DVec2::new(0.0, 1.0));

        Ok(())
    }

    #[test]
    fn cage_scaling_factor() -> Result<(), CageError> {
        let mut cage = CageConfig::new(square(10.0))?;
        assert_eq!(cage.scaling_factor(), &[1.0; 4]);

        cage.set_deformed(square(20.0))?;
        assert_eq!(cage.scaling_factor(), &[2.0; 4]);

        cage.move_deformed_vertex(1, DVec2::new(20.0, 15.0))?;
        assert_relative_eq!(cage.scaling_factor()[0], 2.5);
        assert_relative_eq!(cage.scaling_factor()[1], 0.5);
        assert_relative_eq!(cage.normals_d()[0].x, 0.6);
        assert_relative_eq!(cage.normals_d()[0].y, -0.8);

        cage.reset_deformed();
        assert_eq!(cage.vertices_d(), cage.vertices());
        assert_eq!(cage.scaling_factor(), &[1.0; 4]);

        Ok(())
    }

    #[test]
    fn cage_translate_deformed() -> Result<(), CageError> {
        let mut cage = CageConfig::new(square(4.0))?;
        cage.translate_deformed(DVec2::new(2.5, -1.0))?;
        assert_eq!(cage.vertices_d()[2], DVec2::new(6.5, 3.0));
        assert_eq!(cage.scaling_factor(), &[1.0; 4]);

        let before = cage.vertices_d().to_vec();
        assert_eq!(
            cage.translate_deformed(DVec2::new(f64::NAN, 0.0)),
            Err(CageError::NonFiniteVertex(0))
        );
        assert_eq!(
            cage.translate_deformed(DVec2::new(0.0, f64::INFINITY)),
            Err(CageError::NonFiniteVertex(0))
        );
        assert_eq!(cage.vertices_d(), &before[..]);
        assert_eq!(cage.bounding_box(), Rect::new(0, 0, 5, 5));

        assert_eq!(
            cage.move_deformed_vertex(4, DVec2::ZERO),
            Err(CageError::VertexIndexOutOfBounds(4, 4))
        );

        Ok(())
    }

    #[test]
    fn cage_serde_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let json = r#"{"vertices": [[0, 0], [4, 0], [0, 4]]}"#;
        let cage: CageConfig = serde_json::from_str(json)?;
        assert_eq!(cage.num_vertices(), 3);
        assert_eq!(cage.vertices_d(), cage.vertices());

        let outline: CageOutline = cage.clone().into();
        assert_eq!(outline.deformed.as_deref(), Some(cage.vertices()));

        let bad = r#"{"vertices": [[0, 0], [4, 0]]}"#;
        assert!(serde_json::from_str::<CageConfig>(bad).is_err());

        Ok(())
    }
}
