//! Geometry of the feasible region, for handing to a plotting tool.

use crate::error::ModelError;
use crate::production::{Capacities, LABOR_CONSTRAINT, RECIPE, WOOD_CONSTRAINT};

const EPS: f64 = 1e-9;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub chairs: f64,
    pub tables: f64,
}

/// `chairs_coef * chairs + tables_coef * tables <= rhs`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryLine {
    pub name: String,
    pub chairs_coef: f64,
    pub tables_coef: f64,
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibleRegion {
    pub lines: Vec<BoundaryLine>,
    /// Corners of the continuous region, counter-clockwise from the origin
    pub vertices: Vec<Point>,
}

/// Lines evaluated on an evenly spaced grid of chair counts
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSamples {
    pub chairs: Vec<f64>,
    /// One series per boundary line, in the same order as `lines`
    pub lines: Vec<Vec<f64>>,
    /// Upper edge of the feasible area at each sample
    pub feasible_upper: Vec<f64>,
}

impl Point {
    pub fn new(chairs: f64, tables: f64) -> Self {
        Self { chairs, tables }
    }
}

impl BoundaryLine {
    /// Tables on the line for a given number of chairs
    pub fn tables_at(&self, chairs: f64) -> f64 {
        (self.rhs - self.chairs_coef * chairs) / self.tables_coef
    }

    pub fn chairs_intercept(&self) -> f64 {
        self.rhs / self.chairs_coef
    }

    pub fn tables_intercept(&self) -> f64 {
        self.rhs / self.tables_coef
    }
}

impl FeasibleRegion {
    pub fn new(capacities: Capacities) -> Result<Self, ModelError> {
        capacities.validate()?;

        let lines = vec![
            BoundaryLine {
                name: LABOR_CONSTRAINT.to_string(),
                chairs_coef: RECIPE.labor_per_chair,
                tables_coef: RECIPE.labor_per_table,
                rhs: capacities.labor,
            },
            BoundaryLine {
                name: WOOD_CONSTRAINT.to_string(),
                chairs_coef: RECIPE.wood_per_chair,
                tables_coef: RECIPE.wood_per_table,
                rhs: capacities.wood,
            },
        ];
        let vertices = corners(&lines);

        Ok(Self { lines, vertices })
    }

    /// Area of the continuous region (shoelace formula)
    pub fn area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.chairs * b.tables - b.chairs * a.tables
            })
            .sum();
        twice.abs() / 2.0
    }

    /// Sample every line at `samples` evenly spaced chair counts in `[0, max_chairs]`
    pub fn sample(&self, max_chairs: f64, samples: usize) -> RegionSamples {
        let chairs: Vec<f64> = match samples {
            0 => Vec::new(),
            1 => vec![0.0],
            n => (0..n).map(|i| max_chairs * i as f64 / (n - 1) as f64).collect(),
        };

        let lines: Vec<Vec<f64>> = self
            .lines
            .iter()
            .map(|line| chairs.iter().map(|&x| line.tables_at(x)).collect())
            .collect();

        let feasible_upper = (0..chairs.len())
            .map(|i| lines.iter().map(|series| series[i].max(0.0)).fold(f64::INFINITY, f64::min))
            .collect();

        RegionSamples {
            chairs,
            lines,
            feasible_upper,
        }
    }
}

/// Feasible intersections of every pair of boundary lines and axes
fn corners(lines: &[BoundaryLine]) -> Vec<Point> {
    // (a, b, c) for a*x + b*y <= c, axes written as -x <= 0 and -y <= 0
    let mut halfplanes = vec![(-1.0, 0.0, 0.0), (0.0, -1.0, 0.0)];
    halfplanes.extend(lines.iter().map(|l| (l.chairs_coef, l.tables_coef, l.rhs)));

    let mut points: Vec<Point> = Vec::new();
    for i in 0..halfplanes.len() {
        for j in (i + 1)..halfplanes.len() {
            let (a1, b1, c1) = halfplanes[i];
            let (a2, b2, c2) = halfplanes[j];
            let det = a1 * b2 - a2 * b1;
            if det.abs() < EPS {
                continue;
            }
            // +0.0 folds -0.0 into 0.0
            let p = Point::new((c1 * b2 - c2 * b1) / det + 0.0, (a1 * c2 - a2 * c1) / det + 0.0);
            let inside = halfplanes.iter().all(|&(a, b, c)| a * p.chairs + b * p.tables <= c + EPS);
            let seen = points
                .iter()
                .any(|q| (q.chairs - p.chairs).abs() < EPS && (q.tables - p.tables).abs() < EPS);
            if inside && !seen {
                points.push(p);
            }
        }
    }

    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.chairs).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.tables).sum::<f64>() / n;
    points.sort_by(|p, q| {
        let ap = (p.tables - cy).atan2(p.chairs - cx);
        let aq = (q.tables - cy).atan2(q.chairs - cx);
        ap.total_cmp(&aq)
    });

    // Start from the origin, which is always feasible
    if let Some(origin) = points.iter().position(|p| p.chairs.abs() < EPS && p.tables.abs() < EPS) {
        points.rotate_left(origin);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(labor: f64, wood: f64) -> FeasibleRegion {
        FeasibleRegion::new(Capacities::new(labor, wood)).unwrap()
    }

    #[test]
    fn test_original_region_is_labor_triangle() {
        let r = region(40.0, 30.0);

        assert_eq!(
            r.vertices,
            vec![Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(0.0, 8.0)]
        );
        assert!((r.area() - 80.0).abs() < 1e-9);
        assert_eq!(r.lines[0].chairs_intercept(), 20.0);
        assert_eq!(r.lines[1].tables_intercept(), 10.0);
    }

    #[test]
    fn test_wood_can_bind_alone() {
        // Wood 15 sits entirely inside the labor triangle
        let r = region(40.0, 15.0);

        assert_eq!(r.vertices.len(), 3);
        assert!(r.vertices.contains(&Point::new(15.0, 0.0)));
        assert!(r.vertices.contains(&Point::new(0.0, 5.0)));
    }

    #[test]
    fn test_crossing_lines_add_a_vertex() {
        // 2x + 5y <= 40 and x + 3y <= 21 cross at (15, 2)
        let r = region(40.0, 21.0);

        assert_eq!(r.vertices.len(), 4);
        let crossing = r
            .vertices
            .iter()
            .find(|p| p.chairs > 0.0 && p.tables > 0.0)
            .unwrap();
        assert!((crossing.chairs - 15.0).abs() < 1e-9);
        assert!((crossing.tables - 2.0).abs() < 1e-9);
        assert_eq!(r.vertices[0], Point::new(0.0, 0.0));
    }

    #[test]
    fn test_degenerate_region_is_a_point() {
        let r = region(0.0, 0.0);

        assert_eq!(r.vertices, vec![Point::new(0.0, 0.0)]);
        assert_eq!(r.area(), 0.0);
    }

    #[test]
    fn test_samples_follow_lines() {
        let r = region(40.0, 30.0);
        let s = r.sample(20.0, 5);

        assert_eq!(s.chairs, vec![0.0, 5.0, 10.0, 15.0, 20.0]);
        assert_eq!(s.lines[0], vec![8.0, 6.0, 4.0, 2.0, 0.0]);
        assert!((s.lines[1][0] - 10.0).abs() < 1e-12);
        assert_eq!(s.feasible_upper, vec![8.0, 6.0, 4.0, 2.0, 0.0]);
    }

    #[test]
    fn test_negative_capacity_rejected() {
        assert!(FeasibleRegion::new(Capacities::new(40.0, -3.0)).is_err());
    }
}
