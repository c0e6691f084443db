use crate::error::{MolSwarmError, MsResult};

/// Clamped piecewise-linear map from a raw score onto [0, 1]-style
/// desirability. Points must be sorted by x and strictly increasing.
#[derive(Debug, Clone)]
pub struct DesirabilityCurve {
    points: Vec<(f32, f32)>,
}

impl DesirabilityCurve {
    pub fn new(points: Vec<(f32, f32)>) -> MsResult<Self> {
        if points.len() < 2 {
            return Err(MolSwarmError::Config(
                "desirability curve needs at least two points".to_string(),
            ));
        }
        if points.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(MolSwarmError::Config(
                "desirability curve x values must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { points })
    }

    /// Interpolates at `x`, clamping outside the covered range.
    pub fn value(&self, x: f32) -> f32 {
        let first = self.points[0];
        let last = self.points[self.points.len() - 1];
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }
        for w in self.points.windows(2) {
            let (x0, y0) = w[0];
            let (x1, y1) = w[1];
            if x <= x1 {
                let t = (x - x0) / (x1 - x0);
                return y0 + t * (y1 - y0);
            }
        }
        last.1
    }

    pub fn apply(&self, xs: &[f32]) -> Vec<f32> {
        xs.iter().map(|&x| self.value(x)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_between_points() {
        let curve = DesirabilityCurve::new(vec![(0.0, 0.0), (10.0, 1.0)]).unwrap();
        assert!((curve.value(5.0) - 0.5).abs() < 1e-6);
        assert!((curve.value(2.5) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_clamps_outside_range() {
        let curve = DesirabilityCurve::new(vec![(-1.0, 0.2), (1.0, 0.8)]).unwrap();
        assert_eq!(curve.value(-5.0), 0.2);
        assert_eq!(curve.value(5.0), 0.8);
    }

    #[test]
    fn test_rejects_unsorted_points() {
        assert!(DesirabilityCurve::new(vec![(1.0, 0.0), (0.0, 1.0)]).is_err());
        assert!(DesirabilityCurve::new(vec![(1.0, 0.0)]).is_err());
    }

    #[test]
    fn test_multi_segment() {
        let curve =
            DesirabilityCurve::new(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 0.5), (4.0, 0.5)]).unwrap();
        assert!((curve.value(1.5) - 0.75).abs() < 1e-6);
        assert_eq!(curve.value(3.0), 0.5);
    }
}
