//! Fixed-order Gauss-Legendre rules on [-1, 1], and composite
//! rules built from them.

/// Integrates `f` over (a, b) with the 16-point rule.
pub fn gauss_16<F>(f: F, a: f64, b: f64) -> f64 where F: Fn(f64) -> f64 {
    let half = 0.5 * (b - a);
    let mid = 0.5 * (b + a);
    let integral: f64 = GAUSS_16_NODES.iter()
        .zip(GAUSS_16_WEIGHTS.iter())
        .map(|(t, w)| w * f(mid + half * t))
        .sum();
    half * integral
}

/// Integrates `f` over (a, b) with the 32-point rule.
pub fn gauss_32<F>(f: F, a: f64, b: f64) -> f64 where F: Fn(f64) -> f64 {
    let half = 0.5 * (b - a);
    let mid = 0.5 * (b + a);
    let integral: f64 = GAUSS_32_NODES.iter()
        .zip(GAUSS_32_WEIGHTS.iter())
        .map(|(t, w)| w * f(mid + half * t))
        .sum();
    half * integral
}

/// Integrates `f` over (a, b), splitting the interval into `n`
/// equal panels and applying the 16-point rule to each.
pub fn composite_gauss<F>(f: F, a: f64, b: f64, n: usize) -> f64 where F: Fn(f64) -> f64 {
    let n = n.max(1);
    let h = (b - a) / (n as f64);
    (0..n)
        .map(|i| {
            let lower = a + (i as f64) * h;
            gauss_16(&f, lower, lower + h)
        })
        .sum()
}

/// Integrates `f` over the panels defined by consecutive entries of
/// `breaks`, which must be sorted.
pub fn piecewise_gauss<F>(f: F, breaks: &[f64]) -> f64 where F: Fn(f64) -> f64 {
    breaks.windows(2)
        .map(|w| gauss_16(&f, w[0], w[1]))
        .sum()
}


pub(crate) static GAUSS_16_NODES: [f64; 16] = [
    -9.894009349916499e-1,
    -9.445750230732326e-1,
    -8.656312023878317e-1,
    -7.554044083550030e-1,
    -6.178762444026437e-1,
    -4.580167776572274e-1,
    -2.816035507792589e-1,
    -9.501250983763744e-2,
    9.501250983763744e-2,
    2.816035507792589e-1,
    4.580167776572274e-1,
    6.178762444026437e-1,
    7.554044083550030e-1,
    8.656312023878317e-1,
    9.445750230732326e-1,
    9.894009349916499e-1,
];

pub(crate) static GAUSS_16_WEIGHTS: [f64; 16] = [
    2.715245941175400e-2,
    6.225352393864800e-2,
    9.515851168249300e-2,
    1.246289712555340e-1,
    1.495959888165770e-1,
    1.691565193950025e-1,
    1.826034150449236e-1,
    1.894506104550685e-1,
    1.894506104550685e-1,
    1.826034150449236e-1,
    1.691565193950025e-1,
    1.495959888165770e-1,
    1.246289712555340e-1,
    9.515851168249300e-2,
    6.225352393864800e-2,
    2.715245941175400e-2,
];

pub(crate) static GAUSS_32_NODES: [f64; 32] = [
    -9.972638618494816e-1,
    -9.856115115452683e-1,
    -9.647622555875064e-1,
    -9.349060759377397e-1,
    -8.963211557660521e-1,
    -8.493676137325700e-1,
    -7.944837959679424e-1,
    -7.321821187402897e-1,
    -6.630442669302152e-1,
    -5.877157572407623e-1,
    -5.068999089322294e-1,
    -4.213512761306353e-1,
    -3.318686022821276e-1,
    -2.392873622521371e-1,
    -1.444719615827965e-1,
    -4.830766568773832e-2,
    4.830766568773832e-2,
    1.444719615827965e-1,
    2.392873622521371e-1,
    3.318686022821276e-1,
    4.213512761306353e-1,
    5.068999089322294e-1,
    5.877157572407623e-1,
    6.630442669302152e-1,
    7.321821187402897e-1,
    7.944837959679424e-1,
    8.493676137325700e-1,
    8.963211557660521e-1,
    9.349060759377397e-1,
    9.647622555875064e-1,
    9.856115115452683e-1,
    9.972638618494816e-1,
];

pub(crate) static GAUSS_32_WEIGHTS: [f64; 32] = [
    7.018610000000000e-3,
    1.627439500000000e-2,
    2.539206500000000e-2,
    3.427386300000000e-2,
    4.283589800000000e-2,
    5.099805900000000e-2,
    5.868409350000000e-2,
    6.582222280000000e-2,
    7.234579411000000e-2,
    7.819389578700000e-2,
    8.331192422690000e-2,
    8.765209300440000e-2,
    9.117387869576400e-2,
    9.384439908080460e-2,
    9.563872007927486e-2,
    9.654008851472780e-2,
    9.654008851472780e-2,
    9.563872007927486e-2,
    9.384439908080460e-2,
    9.117387869576400e-2,
    8.765209300440000e-2,
    8.331192422690000e-2,
    7.819389578700000e-2,
    7.234579411000000e-2,
    6.582222280000000e-2,
    5.868409350000000e-2,
    5.099805900000000e-2,
    4.283589800000000e-2,
    3.427386300000000e-2,
    2.539206500000000e-2,
    1.627439500000000e-2,
    7.018610000000000e-3,
];
