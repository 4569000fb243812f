use bencher::{benchmark_group, benchmark_main, Bencher};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use dci::{Dci, Matrix};

benchmark_main!(benches);
benchmark_group!(benches, build, query_single_level, query_hierarchical);

const SEED: u64 = 123456789;
const N: usize = 10_000;
const DIM: usize = 64;

fn gaussian_matrix(rng: &mut StdRng, n: usize, dim: usize) -> Vec<f64> {
    (0..n * dim).map(|_| rng.sample(StandardNormal)).collect()
}

fn build(bench: &mut Bencher) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let data = gaussian_matrix(&mut rng, N, DIM);
    bench.iter(|| {
        let mut index = Dci::builder().seed(SEED).build(DIM, 4, 16).unwrap();
        index
            .add(Matrix::new(&data, N, DIM).unwrap(), 1, 10, 1.0, 1.0, false)
            .unwrap();
        index
    })
}

fn query_single_level(bench: &mut Bencher) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let data = gaussian_matrix(&mut rng, N, DIM);
    let mut index = Dci::builder().seed(SEED).build(DIM, 4, 16).unwrap();
    index
        .add(Matrix::new(&data, N, DIM).unwrap(), 1, 10, 1.0, 1.0, false)
        .unwrap();

    let queries = gaussian_matrix(&mut rng, 64, DIM);
    bench.iter(|| {
        index
            .query(Matrix::new(&queries, 64, DIM).unwrap(), 10, 10, 0.1, 0.05, false)
            .unwrap()
    })
}

fn query_hierarchical(bench: &mut Bencher) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let data = gaussian_matrix(&mut rng, N, DIM);
    let mut index = Dci::builder().seed(SEED).build(DIM, 4, 16).unwrap();
    index
        .add(Matrix::new(&data, N, DIM).unwrap(), 3, 20, 1.0, 0.2, false)
        .unwrap();

    let queries = gaussian_matrix(&mut rng, 64, DIM);
    bench.iter(|| {
        index
            .query(Matrix::new(&queries, 64, DIM).unwrap(), 10, 20, 0.1, 0.05, false)
            .unwrap()
    })
}
