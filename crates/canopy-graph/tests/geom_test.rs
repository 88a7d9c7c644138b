use canopy_graph::{Complex, Polar, Position};
use std::f64::consts::PI;

const EPS: f64 = 1e-9;

fn close(a: Complex, b: Complex) -> bool {
    (a - b).norm() < EPS
}

#[test]
fn complex_polar_conversion_round_trips() {
    let samples = [
        Complex::new(1.0, 0.0),
        Complex::new(-3.5, 2.25),
        Complex::new(0.001, -7.0),
        Complex::new(-1e3, -1e-3),
    ];
    for c in samples {
        assert!(close(c.to_polar().to_complex(), c), "{c:?}");
        let p = c.to_polar();
        assert!((0.0..2.0 * PI).contains(&p.theta));
    }

    let p = Polar::new(-PI / 4.0, 2.0);
    let back = p.to_complex().to_polar();
    assert!((back.theta - p.theta).abs() < EPS);
    assert!((back.rho - p.rho).abs() < EPS);
}

#[test]
fn complex_arithmetic() {
    let a = Complex::new(1.0, 2.0);
    let b = Complex::new(3.0, -1.0);
    assert_eq!(a + b, Complex::new(4.0, 1.0));
    assert_eq!(a.prod(b), Complex::new(5.0, 5.0));
    assert!(close(a.prod(b).div(b), a));
    assert_eq!(a.conjugate(), Complex::new(1.0, -2.0));
    assert_eq!(a.squared_norm(), 5.0);
}

#[test]
fn moebius_keeps_points_inside_the_unit_disk() {
    let mut count = 0;
    for i in 0..12 {
        for j in 0..6 {
            let angle_c = i as f64 * PI / 6.0;
            let angle_z = j as f64 * PI / 3.0 + 0.2;
            let c = Polar::new(angle_c, 0.1 + 0.07 * j as f64).to_complex();
            let z = Polar::new(angle_z, 0.95 - 0.07 * i as f64).to_complex();
            let w = z.moebius(c);
            assert!(w.norm() < 1.0, "z={z:?} c={c:?} -> {w:?}");
            count += 1;
        }
    }
    assert_eq!(count, 72);
}

#[test]
fn moebius_inverse_translation_recovers_the_point() {
    let c = Complex::new(0.3, -0.4);
    let z = Complex::new(-0.2, 0.55);
    let there = z.moebius(c);
    let back = there.moebius(-c);
    assert!(close(back, z));
}

#[test]
fn moebius_ignores_translations_outside_the_disk() {
    let z = Complex::new(0.2, 0.1);
    assert_eq!(z.moebius(Complex::new(1.0, 0.0)), z);
    assert_eq!(z.moebius(Complex::new(3.0, 4.0)), z);
}

#[test]
fn position_set_converts_into_own_form() {
    let mut cart = Position::zero(true);
    cart.set(Position::Polar(Polar::new(PI, 2.0)));
    assert!(cart.is_complex());
    assert!(close(cart.getc(), Complex::new(-2.0, 0.0)));
}
