//! Procedural music for the live source.

/// Glicol composition: a gated saw lead over a slow drone, pitched so its
/// partials sweep through the prime-mapped bands
pub const GLICOL_COMPOSITION: &str = r#"
~gate: speed 2.0 >> seq 60 _60 _~a 48
~a: choose 48 48 48 72 0 0 0
~amp: ~gate >> envperc 0.001 0.3
~pit: ~gate >> mul 230
~lead: saw ~pit >> mul ~amp >> lpf ~mod 5.0 >> mul 0.1
~mod: sin 0.2 >> mul 1300 >> add 1500
~drone: sin 110 >> mul 0.05
o: ~lead >> add ~drone >> plate 0.1
"#;
