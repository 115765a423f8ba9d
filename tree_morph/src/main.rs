//! tree_morph — interactive entry point.

use morph_field::MorphConfig;
use tree_morph::app::{run, AppConfig};
use std::io::{self, Write};

fn main() {
    env_logger::init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Tree Morph — Gesture Controlled Christmas Tree        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard simulation  (use --features leap for hardware)");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut cfg = if args.iter().any(|a| a == "--quick") {
        println!("  Quick-start: 1125 ornaments, default smoothing and morph rate\n");
        AppConfig::default()
    } else {
        configure_interactively()
    };

    match seed_flag(&args) {
        Ok(Some(seed)) => cfg.seed = seed,
        Ok(None)       => {}
        Err(raw)       => {
            log::warn!("ignoring --seed {:?}", raw);
            println!("  ⚠  --seed {:?} is not a whole number; keeping seed {}.", raw, cfg.seed);
        }
    }
    if args.iter().any(|a| a == "--no-camera") {
        cfg.deny_camera = true;
    }

    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `--seed N`, if given.  `Err` carries the text that did not parse.
fn seed_flag(args: &[String]) -> Result<Option<u64>, String> {
    let Some(i) = args.iter().position(|a| a == "--seed") else { return Ok(None) };
    let raw = args.get(i + 1).map(String::as_str).unwrap_or("");
    raw.parse::<u64>().map(Some).map_err(|_| raw.to_string())
}

/// Same rule `MorphConfig::validate` enforces at start-up.
fn rate_accepted(rate: f32, morph: &MorphConfig) -> bool {
    MorphConfig { rate, ..*morph }.validate().is_ok()
}

fn configure_interactively() -> AppConfig {
    let mut cfg = AppConfig::default();

    cfg.layout.ornament_count = read_line("  Ornament count (default 1125): ")
        .trim().parse::<usize>().unwrap_or(1125).clamp(1, 20_000);

    cfg.seed = read_line("  Layout seed (default 2024): ")
        .trim().parse::<u64>().unwrap_or(2024);

    let alpha: f32 = loop {
        let a = read_line("  Smoothing 0.0–0.99, higher is steadier (default 0.3): ")
            .trim().parse::<f32>().unwrap_or(0.3);
        if (0.0..1.0).contains(&a) { break a; }
        println!("    ⚠  0.0–0.99 only.");
    };
    cfg.conditioner.alpha = alpha;

    let rate: f32 = loop {
        let r = read_line("  Morph rate per second (default 3.0): ")
            .trim().parse::<f32>().unwrap_or(3.0);
        if rate_accepted(r, &cfg.morph) { break r; }
        println!("    ⚠  above 0 and at most {:.1} only.", 1.0 / cfg.morph.max_dt);
    };
    cfg.morph.rate = rate;

    cfg
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn seed_flag_parses() {
        assert_eq!(seed_flag(&args(&["--quick", "--seed", "7"])), Ok(Some(7)));
        assert_eq!(seed_flag(&args(&["--quick"])), Ok(None));
    }

    #[test]
    fn bad_seed_is_reported() {
        assert_eq!(seed_flag(&args(&["--seed", "abc"])), Err("abc".to_string()));
        assert_eq!(seed_flag(&args(&["--seed"])), Err(String::new()));
    }

    #[test]
    fn rate_prompt_bounds() {
        let morph = MorphConfig::default();
        assert!(!rate_accepted(0.0, &morph));
        assert!(rate_accepted(0.05, &morph));
        assert!(rate_accepted(10.0, &morph));
        assert!(!rate_accepted(10.5, &morph));
        assert!(!rate_accepted(f32::NAN, &morph));
    }
}
