/// Asserts that two `f64` expressions differ by no more than `$prec`.
///
/// ```
/// use sir_quant::assert_almost_eq;
///
/// assert_almost_eq!(0.1 + 0.2, 0.3, 1e-12);
/// ```
#[macro_export]
macro_rules! assert_almost_eq {
    ($a:expr, $b:expr, $prec:expr $(,)?) => {{
        let (left, right, prec): (f64, f64, f64) = ($a, $b, $prec);
        if !$crate::numeric::almost_eq(left, right, prec) {
            panic!(
                "assertion failed: `{}` and `{}` differ by {:e} > {:e} (left: `{}`, right: `{}`)",
                stringify!($a),
                stringify!($b),
                (left - right).abs(),
                prec,
                left,
                right
            );
        }
    }};
}
