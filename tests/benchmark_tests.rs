//! Performance benchmarks for the board hot paths

use client::game::ClientBoard;
use server::game::GameState;
use server::identity::Identity;
use shared::{encode_deltas, BoardGenerator, DeltaDecoder, DeltaUnit, Rgb, MAX_BOARD_SIZE};
use std::time::Instant;

/// Benchmarks seeded board generation at the largest size
#[test]
fn benchmark_board_generation() {
    let iterations = 1_000;
    let start = Instant::now();

    for seed in 0..iterations {
        let goals = BoardGenerator::new(seed)
            .generate(256, MAX_BOARD_SIZE)
            .unwrap();
        assert_eq!(goals.len(), MAX_BOARD_SIZE * MAX_BOARD_SIZE);
    }

    let duration = start.elapsed();
    println!(
        "Board generation: {} boards in {:?} ({:.2} μs/board)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 1 second
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks server-side toggling with many players on one board
#[test]
fn benchmark_server_marks() {
    let board = BoardGenerator::new(1).generate_board(256, 16).unwrap();
    let mut game = GameState::new(board);
    let players: Vec<Identity> = (0..32)
        .map(|i| Identity::new(format!("10.0.0.{}", i)))
        .collect();
    for (i, identity) in players.iter().enumerate() {
        game.join_player(identity.clone(), Rgb::new(i as u8, 0, 0));
    }

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let identity = &players[i % players.len()];
        game.mark(identity, (i * 7) % 256).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Server marks: {} toggles in {:?} ({:.2} ns/toggle)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks fog-of-war updates on the client mirror
#[test]
fn benchmark_client_fog_updates() {
    let own = Rgb::new(200, 10, 10);
    let goals: Vec<u8> = (0..=255).collect();
    let mut board = ClientBoard::new(16, &goals, Some(own)).unwrap();

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        board.apply_mark((i * 13) % 256, own).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Fog updates: {} marks in {:?} ({:.2} ns/mark)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Stress tests delta decoding with badly fragmented input
#[test]
fn stress_test_fragmented_deltas() {
    let units: Vec<DeltaUnit> = (0..10_000)
        .map(|i| DeltaUnit::new((i % 256) as u8, Rgb::new(i as u8, (i >> 8) as u8, 7)))
        .collect();
    let bytes = encode_deltas(&units);

    let start = Instant::now();

    let mut decoder = DeltaDecoder::new();
    let mut decoded = Vec::with_capacity(units.len());
    for chunk in bytes.chunks(3) {
        decoder.push(chunk);
        decoded.extend(decoder.by_ref());
    }

    let duration = start.elapsed();
    println!("Delta decoding: {} units in {:?}", decoded.len(), duration);

    assert_eq!(decoded, units);
    assert_eq!(decoder.pending(), 0);
    // Should complete in under 100ms
    assert!(duration.as_millis() < 100);
}
