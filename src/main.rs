use stress_test::{stress_test_bounded, stress_test_growable, stress_test_scaling};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            DELIVERY BUFFER STRESS TESTS                    ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    // Test 1: growable buffer, small scale
    let stats = stress_test_growable(4, 25_000);
    stats.print();

    // Test 2: bounded buffer with blocking producers
    let stats = stress_test_bounded(4, 25_000, 1_024);
    stats.print();

    // Test 3: growable buffer, larger scale
    let stats = stress_test_growable(8, 125_000);
    stats.print();

    // Test 4: tight window, heavy blocking
    let stats = stress_test_bounded(8, 12_500, 64);
    stats.print();

    // Test 5: scaling analysis
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║          SCALING ANALYSIS (growable)                       ║");
    println!("╚════════════════════════════════════════════════════════════╝");
    stress_test_scaling(16, 4);

    println!("\n✓ All stress tests completed successfully!");
}
