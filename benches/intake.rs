use criterion::{criterion_group, criterion_main, Criterion};

/// Build a multipart message with `count` base64 attachments.
fn synthetic_eml(count: usize) -> Vec<u8> {
    let mut raw = String::from(
        "From: bench@example.com\r\n\
         Subject: Bench message\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/mixed; boundary=\"bench\"\r\n\
         \r\n\
         --bench\r\n\
         Content-Type: text/plain\r\n\
         \r\n\
         Body text.\r\n",
    );
    for i in 0..count {
        raw.push_str(&format!(
            "--bench\r\n\
             Content-Type: application/octet-stream; name=\"file_{i}.bin\"\r\n\
             Content-Disposition: attachment; filename=\"file_{i}.bin\"\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             aGVsbG8gd29ybGQgaGVsbG8gd29ybGQgaGVsbG8gd29ybGQ=\r\n"
        ));
    }
    raw.push_str("--bench--\r\n");
    raw.into_bytes()
}

fn bench_intake(c: &mut Criterion) {
    let small = synthetic_eml(2);
    let large = synthetic_eml(50);

    c.bench_function("intake_2_attachments", |b| {
        b.iter(|| maildepot::intake::message_data_from_eml(&small).unwrap())
    });

    c.bench_function("intake_50_attachments", |b| {
        b.iter(|| maildepot::intake::message_data_from_eml(&large).unwrap())
    });
}

criterion_group!(benches, bench_intake);
criterion_main!(benches);
