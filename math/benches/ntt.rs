use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::thread_rng;
use rgsw_math::{
    modulus::Prime,
    poly::{ntt::Ntt, Domain},
    ring::RnsRing,
};

fn ntt(c: &mut Criterion) {
    let mut b = c.benchmark_group("ntt");
    for log_ring_size in 11..13 {
        let ring_size = 1 << log_ring_size;
        for bits in [29, 50, 61] {
            let q = Prime::gen(bits, log_ring_size + 1);
            let ntt = Ntt::new(&q, ring_size);
            let uniform = q.uniform_distribution();
            let mut a = rand::distributions::Distribution::sample_iter(uniform, thread_rng())
                .take(ring_size)
                .collect::<Vec<_>>();
            let id = BenchmarkId::new(format!("forward/{bits}"), ring_size);
            b.bench_with_input(id, &(), |b, _| b.iter(|| ntt.forward(black_box(&mut a))));
            let id = BenchmarkId::new(format!("backward/{bits}"), ring_size);
            b.bench_with_input(id, &(), |b, _| b.iter(|| ntt.backward(black_box(&mut a))));
        }
    }
}

fn mul_mont(c: &mut Criterion) {
    let mut b = c.benchmark_group("mul_mont");
    for log_ring_size in 11..13 {
        let ring_size = 1 << log_ring_size;
        let ring = RnsRing::new(Prime::gen_iter(50, log_ring_size + 1).take(4), ring_size);
        let level = ring.max_level();
        let mut rng = thread_rng();
        let [mut x, mut y] = [(); 2].map(|_| ring.allocate(level, Domain::Evaluation));
        ring.sample_uniform(level, &mut x, &mut rng);
        ring.sample_uniform(level, &mut y, &mut rng);
        let mut z = ring.allocate(level, Domain::Evaluation);
        let id = BenchmarkId::new("reduced", ring_size);
        b.bench_with_input(id, &(), |b, _| b.iter(|| ring.mul_mont(level, &mut z, &x, &y)));
        let id = BenchmarkId::new("lazy", ring_size);
        b.bench_with_input(id, &(), |b, _| b.iter(|| ring.mul_mont_lazy(level, &mut z, &x, &y)));
    }
}

criterion_group!(benches, ntt, mul_mont);
criterion_main!(benches);
