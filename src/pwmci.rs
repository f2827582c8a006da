//! Piecewise monotonic cubic interpolation of tabulated, non-decreasing
//! functions, and the inverse lookups used to sample from them.

const RECURSION_LIMIT: usize = 32;
const PRECISION_LIMIT: f64 = 1.0e-9;

/// Hermite cubic on one interval of the table, with tangents limited
/// so that the interpolant is monotone (Fritsch-Carlson).
#[derive(Copy,Clone,Debug)]
struct Segment {
    x: [f64; 2],
    f: [f64; 2],
    m: [f64; 2],
}

impl Segment {
    /// The segment between `table[i-1]` and `table[i]`; requires `1 <= i < len`
    /// and a table of at least three points.
    fn construct(i: usize, table: &[[f64; 2]]) -> Segment {
        let len = table.len();
        let slope = |j: usize| (table[j][1] - table[j-1][1]) / (table[j][0] - table[j-1][0]);

        // Slopes of the secant lines either side of, and across, the interval
        let secant = [
            if i == 1 { slope(1) } else { slope(i - 1) },
            slope(i),
            if i == len - 1 { slope(i) } else { slope(i + 1) },
        ];

        // Average the secants, unless the curve is flat or turns over
        let mut tangent = [0.0; 2];
        tangent[0] = if secant[0] * secant[1] > 0.0 {
            0.5 * (secant[0] + secant[1])
        } else {
            0.0
        };
        tangent[1] = if secant[1] * secant[2] > 0.0 {
            0.5 * (secant[1] + secant[2])
        } else {
            0.0
        };

        if secant[1] != 0.0 {
            tangent[0] = tangent[0].min(3.0 * secant[1]);
            tangent[1] = tangent[1].min(3.0 * secant[1]);
        }

        Segment {
            x: [table[i-1][0], table[i][0]],
            f: [table[i-1][1], table[i][1]],
            m: tangent,
        }
    }

    fn evaluate(&self, x: f64) -> f64 {
        let h = self.x[1] - self.x[0];
        let t = (x - self.x[0]) / h;
        let h00 = (1.0 + 2.0 * t) * (1.0 - t).powi(2);
        let h10 = t * (1.0 - t).powi(2);
        let h01 = t.powi(2) * (3.0 - 2.0 * t);
        let h11 = t.powi(2) * (t - 1.0);
        self.f[0] * h00 + self.f[1] * h01 + h * (self.m[0] * h10 + self.m[1] * h11)
    }

    /// Solves `evaluate(x) == f` for x in the segment, given
    /// `self.f[0] < f <= self.f[1]`, by Brent's method.
    fn solve(&self, f: f64) -> (f64, usize) {
        #[derive(Copy,Clone)]
        struct Root {
            x: f64,
            f: f64,
        }

        let is_between = |x: f64, a: f64, b: f64| {
            if a < b {
                x > a && x < b
            } else if b < a {
                x > b && x < a
            } else {
                true
            }
        };

        let scale = (self.x[1] - self.x[0]).abs().max(self.x[0].abs());

        // root[0] is always the best estimate, root[1] brackets it,
        // root[2] and root[3] are the previous two estimates
        let mut root = [Root { x: self.x[0], f: self.f[0] - f }; 4];
        root[1] = Root { x: self.x[1], f: self.f[1] - f };

        if root[1].f.abs() < root[0].f.abs() {
            root.swap(0, 1);
        }

        root[2] = root[1];
        root[3] = root[1];

        let mut prev_bisect = true;
        let mut count = 0;

        for _i in 0..RECURSION_LIMIT {
            count += 1;

            let s = if root[0].f != root[2].f && root[1].f != root[2].f {
                // inverse quadratic interpolation
                let r = root[0].f / root[2].f;
                let s = root[0].f / root[1].f;
                let t = root[1].f / root[2].f;
                let p = s * (t * (r-t) * (root[2].x - root[0].x) - (1.0-r) * (root[0].x - root[1].x));
                let q = (t-1.0) * (r-1.0) * (s-1.0);
                root[0].x + p / q
            } else {
                // secant
                root[0].x - root[0].f * (root[0].x - root[1].x) / (root[0].f - root[1].f)
            };

            let reject = !s.is_finite()
                || !is_between(s, 0.25 * (3.0 * root[1].x + root[0].x), root[0].x)
                || (prev_bisect && (s - root[0].x).abs() >= 0.5 * (root[0].x - root[2].x).abs())
                || (!prev_bisect && (s - root[0].x).abs() >= 0.5 * (root[2].x - root[3].x).abs());

            let s = if reject {
                prev_bisect = true;
                0.5 * (root[0].x + root[1].x)
            } else {
                prev_bisect = false;
                s
            };

            root[3] = root[2];
            root[2] = root[0];
            root[0] = Root { x: s, f: self.evaluate(s) - f };

            if root[1].f * root[0].f >= 0.0 {
                root[1] = root[0];
                root[0] = root[2];
            }

            if root[1].f.abs() < root[0].f.abs() {
                root.swap(0, 1);
            }

            if root[0].f == 0.0 || (root[1].x - root[0].x).abs() < PRECISION_LIMIT * scale {
                break;
            }
        }

        (root[0].x, count)
    }
}

/// A tabulated function f(x), with strictly increasing abscissae and
/// non-decreasing ordinates, that can be interpolated and inverted.
#[derive(Clone, Debug, PartialEq)]
pub struct MonotoneTable {
    table: Vec<[f64; 2]>,
}

impl MonotoneTable {
    /// Wraps the given (x, f(x)) pairs, returning `None` if there are
    /// fewer than three, or if they are not correctly ordered.
    pub fn new(table: Vec<[f64; 2]>) -> Option<Self> {
        let ordered = table.windows(2).all(|w| w[1][0] > w[0][0] && w[1][1] >= w[0][1]);
        let finite = table.iter().all(|p| p[0].is_finite() && p[1].is_finite());
        if table.len() >= 3 && ordered && finite {
            Some(Self { table })
        } else {
            None
        }
    }

    pub fn first(&self) -> [f64; 2] {
        self.table[0]
    }

    pub fn last(&self) -> [f64; 2] {
        self.table[self.table.len() - 1]
    }

    /// Interpolates f(x), returning `None` outside the tabulated range.
    pub fn evaluate(&self, x: f64) -> Option<f64> {
        let table = &self.table;

        // Find the i for which table[i-1][0] < x <= table[i][0]
        let i = table.iter().position(|p| x <= p[0])?;
        if i == 0 {
            return if x == table[0][0] { Some(table[0][1]) } else { None };
        }

        Some(Segment::construct(i, table).evaluate(x))
    }

    /// Solves f(x) == f for x, returning `None` if f is outside the
    /// tabulated range. Where f(x) is flat, the lowest solution is returned.
    pub fn invert(&self, f: f64) -> Option<f64> {
        let table = &self.table;

        // Find the i for which table[i-1][1] < f <= table[i][1]
        let i = table.iter().position(|p| f <= p[1])?;
        if i == 0 {
            return if f == table[0][1] { Some(table[0][0]) } else { None };
        }

        let (x, _) = Segment::construct(i, table).solve(f);
        Some(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invert_x_sqd() {
        let mut table: Vec<[f64; 2]> = Vec::new();
        for i in 0..20 {
            let x = (i as f64) / 20.0;
            table.push([x, x.powi(2)]);
        }
        let table = MonotoneTable::new(table).unwrap();

        let y = 0.73;
        let x = table.invert(y).unwrap();
        let err = (x - y.sqrt()).abs();

        println!("got {:e}, expected {:e}, error = {:e}", x, y.sqrt(), err);
        assert!(err < 1.0e-4);
        assert!((table.evaluate(x).unwrap() - y).abs() < 1.0e-8);
    }

    #[test]
    fn invert_shifted_tanh() {
        let mut table: Vec<[f64; 2]> = Vec::new();
        for i in 0..20 {
            let x = 5.0 * (i as f64) / 20.0;
            table.push([x, 1.0 + (x - 2.0).tanh()]);
        }
        let table = MonotoneTable::new(table).unwrap();

        let y = 1.24;
        let x = table.invert(y).unwrap();
        let target = 2.0 - (1.0 - y).atanh();
        let err = (x - target).abs();

        println!("got {:e}, expected {:e}, error = {:e}", x, target, err);
        assert!(err < 1.0e-4);
    }

    #[test]
    fn edges_and_flat_regions() {
        let table = MonotoneTable::new(vec![
            [0.0, 0.0], [1.0, 0.5], [2.0, 0.5], [3.0, 1.0],
        ]).unwrap();

        assert_eq!(table.invert(0.0), Some(0.0));
        assert_eq!(table.invert(-0.1), None);
        assert_eq!(table.invert(1.1), None);
        assert_eq!(table.evaluate(-0.1), None);
        assert_eq!(table.evaluate(0.0), Some(0.0));

        // interpolant does not overshoot on the plateau
        for k in 0..=10 {
            let x = 1.0 + 0.1 * (k as f64);
            let f = table.evaluate(x).unwrap();
            assert!((f - 0.5).abs() < 1.0e-15);
        }

        let x = table.invert(0.75).unwrap();
        println!("f^{{-1}}(0.75) = {}", x);
        assert!(x > 2.0 && x < 3.0);
        assert!((table.evaluate(x).unwrap() - 0.75).abs() < 1.0e-8);
    }

    #[test]
    fn rejects_bad_tables() {
        assert!(MonotoneTable::new(vec![[0.0, 0.0], [1.0, 1.0]]).is_none());
        assert!(MonotoneTable::new(vec![[0.0, 0.0], [1.0, 1.0], [1.0, 2.0]]).is_none());
        assert!(MonotoneTable::new(vec![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0]]).is_none());
    }
}
