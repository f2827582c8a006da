//! Adaptive cubature over rectangles, by recursive subdivision
//! with nested Clenshaw-Curtis rules.

struct Region {
    integral: f64,
    error: f64,
    x: [f64; 2],
    y: [f64; 2],
    cache: [[f64; 3]; 3],
}

impl Region {
    const CLENSHAW_CURTIS_DATA: [(f64, f64, f64); 5] = [
        (0.0,                1.0 / 30.0, 1.0 / 6.0),
        (0.1464466094067262, 4.0 / 15.0, 0.0),
        (0.5,                2.0 / 5.0,  2.0 / 3.0),
        (0.8535533905932738, 4.0 / 15.0, 0.0),
        (1.0,                1.0 / 30.0, 1.0 / 6.0),
    ];

    const CLENSHAW_CURTIS_9_DATA: [(f64, f64, f64); 9] = [
        (0.0000000000000000, 0.0079365079365079, 1.0 / 30.0),
        (0.0380602337443566, 0.0731093246080091, 0.0),
        (0.1464466094067262, 0.1396825396825397, 4.0 / 15.0),
        (0.3086582838174551, 0.1808589293602449, 0.0),
        (0.5000000000000000, 0.1968253968253968, 2.0 / 5.0),
        (0.6913417161825449, 0.1808589293602449, 0.0),
        (0.8535533905932738, 0.1396825396825397, 4.0 / 15.0),
        (0.9619397662556434, 0.0731093246080091, 0.0),
        (1.0000000000000000, 0.0079365079365079, 1.0 / 30.0),
    ];

    const CLENSHAW_CURTIS_9_EXTENDED_NODES: [f64; 17] = [
        0.0000000000000000,
        0.0380602337443566,
        0.1464466094067262,
        0.3086582838174551,
        0.5000000000000000,
        0.6913417161825449,
        0.8535533905932738,
        0.9619397662556434,
        1.0000000000000000,
        1.0380602337443566,
        1.1464466094067262,
        1.3086582838174551,
        1.5000000000000000,
        1.6913417161825449,
        1.8535533905932738,
        1.9619397662556434,
        2.0000000000000000,
    ];

    fn partition<F>(&self, f: &mut F) -> (Self, Self, Self, Self, i32)
    where F: FnMut(f64, f64) -> f64 {
        let mut evals = 0;
        let [x0, x1] = self.x;
        let [y0, y1] = self.y;
        let x_mid = 0.5 * (x0 + x1);
        let y_mid = 0.5 * (y0 + y1);
        let mut z: [[f64; 17]; 17] = Default::default();

        // 17x17 grid of function values, corners come from the cache
        for (i, ty) in Region::CLENSHAW_CURTIS_9_EXTENDED_NODES.iter().enumerate() {
            let y = y0 + 0.5 * ty * (y1 - y0);
            for (j, tx) in Region::CLENSHAW_CURTIS_9_EXTENDED_NODES.iter().enumerate() {
                let x = x0 + 0.5 * tx * (x1 - x0);
                z[i][j] = if i % 8 == 0 && j % 8 == 0 {
                    self.cache[i/8][j/8]
                } else {
                    evals += 1;
                    f(x, y)
                };
            }
        }

        let mut result = [0.0; 4];
        let mut error = [0.0; 4];

        for r in 0..2 {
            for c in 0..2 {
                for i in 0..9 {
                    let (_, wy, ey) = Region::CLENSHAW_CURTIS_9_DATA[i];
                    for j in 0..9 {
                        let (_, wx, ex) = Region::CLENSHAW_CURTIS_9_DATA[j];
                        let val = z[i+8*r][j+8*c];
                        let dy = 0.5 * (y1 - y0);
                        let dx = 0.5 * (x1 - x0);
                        result[2*r+c] += wx * wy * dx * dy * val;
                        error[2*r+c] += ex * ey * dx * dy * val;
                    }
                }
            }
        }

        let bl = Region {
            integral: result[0],
            error: result[0] - error[0],
            x: [x0, x_mid],
            y: [y0, y_mid],
            cache: [
                [z[0][0], z[0][4], z[0][8]],
                [z[4][0], z[4][4], z[4][8]],
                [z[8][0], z[8][4], z[8][8]],
            ]
        };

        let br = Region {
            integral: result[1],
            error: result[1] - error[1],
            x: [x_mid, x1],
            y: [y0, y_mid],
            cache: [
                [z[0][8], z[0][12], z[0][16]],
                [z[4][8], z[4][12], z[4][16]],
                [z[8][8], z[8][12], z[8][16]],
            ]
        };

        let tl = Region {
            integral: result[2],
            error: result[2] - error[2],
            x: [x0, x_mid],
            y: [y_mid, y1],
            cache: [
                [z[8][0], z[8][4], z[8][8]],
                [z[12][0], z[12][4], z[12][8]],
                [z[16][0], z[16][4], z[16][8]],
            ]
        };

        let tr = Region {
            integral: result[3],
            error: result[3] - error[3],
            x: [x_mid, x1],
            y: [y_mid, y1],
            cache: [
                [z[8][8], z[8][12], z[8][16]],
                [z[12][8], z[12][12], z[12][16]],
                [z[16][8], z[16][12], z[16][16]],
            ]
        };

        (bl, br, tl, tr, evals)
    }

    fn new<F>(f: &mut F, x0: f64, x1: f64, y0: f64, y1: f64) -> (Self, i32)
    where F: FnMut(f64, f64) -> f64 {
        let mut evals = 0;
        let mut result = 0.0;
        let mut error = 0.0;
        let mut cache: [[f64; 3]; 3] = Default::default();

        // need to evaluate f(x, y) 5x5 = 25 times, of which 9 can be reused later

        for (i, (t1, w1, e1)) in Region::CLENSHAW_CURTIS_DATA.iter().enumerate() {
            let y = y0 + t1 * (y1 - y0);
            for (j, (t2, w2, e2)) in Region::CLENSHAW_CURTIS_DATA.iter().enumerate() {
                let x = x0 + t2 * (x1 - x0);
                evals += 1;
                let z = f(x, y);
                result += w1 * w2 * (y1 - y0) * (x1 - x0) * z;
                error += e1 * e2 * (y1 - y0) * (x1 - x0) * z;

                // store function for future use
                if i % 2 == 0 && j % 2 == 0 {
                    cache[i/2][j/2] = z;
                }
            }
        }

        (Self {
            integral: result,
            error: result - error,
            x: [x0, x1],
            y: [y0, y1],
            cache,
        }, evals)
    }
}

/// Integrates a real function of two variables `f(x, y)` over a rectangular domain
/// `x0 < x < x1` and `y0 < y < y1`, returning the integral and the number of
/// function evaluations.
///
/// The region with the largest error estimate is quartered until the summed
/// error falls below `tolerance` times the integral, or until `max_recursion`
/// subdivisions have been made.
pub fn integrate_2d<F>(mut f: F, x0: f64, x1: f64, y0: f64, y1: f64, tolerance: f64, max_recursion: i32) -> (f64, i32)
where F: FnMut(f64, f64) -> f64 {
    let mut integral = 0.0;
    let mut regions: Vec<Region> = Vec::with_capacity(16);

    let (region, mut count) = Region::new(&mut f, x0, x1, y0, y1);
    regions.push(region);

    for _i in 0..max_recursion {
        let (sum, error) = regions.iter().fold(
            (0.0, 0.0),
            |acc, e| (acc.0 + e.integral, acc.1 + e.error.abs())
        );
        integral = sum;

        if error <= tolerance * integral.abs() {
            break;
        }

        // grab the region with the largest error
        let Some(region) = regions.pop() else {
            break;
        };

        let (bl, br, tl, tr, evals) = region.partition(&mut f);
        count += evals;

        regions.push(bl);
        regions.push(br);
        regions.push(tl);
        regions.push(tr);

        // prep for next partition
        regions.sort_unstable_by(|a, b| a.error.abs().total_cmp(&b.error.abs()));
    }

    (integral, count)
}

#[cfg(test)]
mod tests {
    use std::f64::consts;
    use super::*;

    #[test]
    fn adaptive_integration() {
        let tol = 1.0e-6;
        let (result, count) = integrate_2d(
            |x, y| 1.0 / (1.0 + x * x * x + 16.0 * y * y),
            0.0, 4.0, 0.0, 4.0,
            tol, 200,
        );
        let target = 0.64778624241275644456;
        let error = (target - result).abs() / target;
        println!("result = {:.6e}, target = {:.6e} [{} evals], err = {:.3e}", result, target, count, error);
        assert!(error < 10.0 * tol);
    }

    #[test]
    fn disc_in_polar_coordinates() {
        // area of a unit disc, weighted by a narrow off-centre gaussian
        let sigma: f64 = 0.05;
        let rho = 0.5;
        let (result, count) = integrate_2d(
            |r, phi| {
                let d2 = r * r + rho * rho - 2.0 * r * rho * phi.cos();
                r * (-d2 / (2.0 * sigma * sigma)).exp() / (2.0 * consts::PI * sigma * sigma)
            },
            0.0, 1.0, 0.0, 2.0 * consts::PI,
            1.0e-6, 400,
        );
        println!("result = {:.9e} [{} evals]", result, count);
        assert!((result - 1.0).abs() < 1.0e-4);
    }
}
