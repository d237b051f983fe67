// ============================================================================
// Reel Property Tests
// Codec fixtures, wraparound and generated-candidate invariants
// ============================================================================

use std::sync::Arc;

use approx::assert_relative_eq;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rf_slot_lab::{
    BLANK, CandidateGenerator, DEMO_REEL, GeneratorFactory, NestedBoundsFactory, OptimizerConfig,
    PayTable, ReelBuilder, ReelCandidateGenerator, VirtualReel, decode_gzip_base64, padding_for,
};

// ============================================================================
// TEST UTILITIES
// ============================================================================

fn random_reel(rng: &mut ChaCha8Rng, len: usize) -> VirtualReel {
    let bytes = (0..len).map(|_| rng.random_range(0..=10u8)).collect();
    VirtualReel::from_bytes(bytes).unwrap()
}

// ============================================================================
// CODEC
// ============================================================================

#[test]
fn test_demo_reel_fixture() {
    let reel = VirtualReel::decode(DEMO_REEL).unwrap();
    assert_eq!(reel.size(), 3550);

    let counts = reel.symbol_counts();
    assert_eq!(counts, vec![2454, 306, 248, 211, 112, 108, 44, 30, 24, 10, 3]);

    let rtp = PayTable::standard().rtp_of(reel.as_bytes()).unwrap();
    assert_relative_eq!(rtp, 0.98, epsilon = 1e-12);

    // stored sorted
    assert!(reel.as_bytes().windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_round_trip_many_reels() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    for len in [1, 2, 7, 8, 9, 255, 256, 4096, 10_000] {
        let reel = random_reel(&mut rng, len);
        let encoded = reel.encode().unwrap();
        assert_eq!(VirtualReel::decode(&encoded).unwrap(), reel, "len {len}");
    }
}

#[test]
fn test_demo_reel_re_encodes() {
    let reel = VirtualReel::decode(DEMO_REEL).unwrap();
    let again = VirtualReel::decode(&reel.encode().unwrap()).unwrap();
    assert_eq!(again, reel);
}

#[test]
fn test_decode_rejects_garbage() {
    for bad in ["", "%%%%", "AAAA", "aGVsbG8gd29ybGQ="] {
        assert!(VirtualReel::decode(bad).is_err(), "{bad:?} decoded");
    }
    // truncated demo stream
    assert!(decode_gzip_base64(&DEMO_REEL[..40]).is_err());
}

// ============================================================================
// WRAPAROUND
// ============================================================================

#[test]
fn test_wraparound_periodicity() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let reel = random_reel(&mut rng, 37);
    let size = reel.size() as i64;
    for _ in 0..1000 {
        let p: i64 = rng.random_range(-1_000_000..1_000_000);
        assert_eq!(reel.get(p), reel.get(p + size));
    }
    assert_eq!(reel.get(-1), reel.get(size - 1));
}

#[test]
fn test_builder_runs() {
    let mut builder = ReelBuilder::new();
    builder.add_symbol(5, 1000);
    let reel = builder.build().unwrap();
    assert_eq!(reel.size(), 1000);
    assert!((0..1000).all(|i| reel.get(i) == 5));
}

// ============================================================================
// GENERATED CANDIDATES
// ============================================================================

#[test]
fn test_candidates_never_exceed_target() {
    let paytable = Arc::new(PayTable::standard());
    for (i, target) in [0.5, 0.9, 0.95, 0.98, 0.999].into_iter().enumerate() {
        for seed in 0..40 {
            let generator = ReelCandidateGenerator::new(
                target,
                256,
                Arc::clone(&paytable),
                ChaCha8Rng::seed_from_u64(seed * 7 + i as u64),
            );
            let result = generator.generate().unwrap();
            assert!(result.rtp >= 0.0);
            assert!(result.rtp <= target + 1e-9, "rtp {} > {target}", result.rtp);

            // padding is minimal: one fewer blank would cross the target
            let zeros = result.reel_bytes.iter().take_while(|&&s| s == BLANK).count();
            let win = paytable.total_payout(&result.reel_bytes).unwrap();
            assert_eq!(zeros, padding_for(win, result.size() - zeros, target));
            if zeros > 0 {
                assert!(win as f64 / (result.size() - 1) as f64 > target);
            }
        }
    }
}

#[test]
fn test_custom_paytable_candidates() {
    let config = OptimizerConfig {
        paytable: PayTable::new(vec![0, 2, 5, 40]).unwrap(),
        target_rtp: 0.9,
        ..OptimizerConfig::quick()
    };
    let mut factory = NestedBoundsFactory::with_seed(&config, 77);
    for run in 0..20 {
        let result = factory.create(run).generate().unwrap();
        assert!(result.reel_bytes.iter().all(|&s| s <= 3));
        assert!(result.rtp <= 0.9 + 1e-9);
    }
}

#[test]
fn test_narrow_window() {
    let paytable = Arc::new(PayTable::standard());
    let generator =
        ReelCandidateGenerator::new(0.98, 1, paytable, ChaCha8Rng::seed_from_u64(0));
    let result = generator.generate().unwrap();
    // counts 10, 9, ..., 1 for symbols 1..=10 and the win is fixed
    assert_eq!(result.size() - padding_for(310, 55, 0.98), 55);
    assert_relative_eq!(result.rtp, 310.0 / result.size() as f64);
}
