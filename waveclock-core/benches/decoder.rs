use chrono::{FixedOffset, TimeZone};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use waveclock_core::generator;
use waveclock_core::{ClockDecoder, DecoderSettings, Modulation};

fn benchmark_feed_throughput(c: &mut Criterion) {
    let start = FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 12, 31, 13, 41, 0)
        .unwrap();

    let mut group = c.benchmark_group("feed");

    for modulation in [Modulation::Dcf77, Modulation::Tdf, Modulation::Msf60] {
        let samples = generator::minutes(modulation, &start, 1);
        // One second of canonical-rate signal per iteration
        let second = &samples[..1000];

        group.throughput(Throughput::Elements(second.len() as u64));
        group.bench_function(format!("{modulation}"), |b| {
            let mut decoder = ClockDecoder::new(DecoderSettings {
                modulation,
                ..Default::default()
            })
            .unwrap();
            b.iter(|| decoder.feed(black_box(second)));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_feed_throughput);
criterion_main!(benches);
