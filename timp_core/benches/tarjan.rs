use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use timp_core::graph::{tarjan, Graph};

struct RingOfCliques {
    clique_size: usize,
    cliques: usize,
}

impl Graph for RingOfCliques {
    type Node = usize;

    fn successors(&self, node: &usize) -> Vec<usize> {
        let clique = node / self.clique_size;
        let within = node % self.clique_size;
        let mut out: Vec<usize> = (0..self.clique_size)
            .filter(|&i| i != within)
            .map(|i| clique * self.clique_size + i)
            .collect();
        if within == self.clique_size - 1 {
            let next_clique = (clique + 1) % self.cliques;
            out.push(next_clique * self.clique_size);
        }
        out
    }

    fn predecessors(&self, node: &usize) -> Vec<usize> {
        let n = self.clique_size * self.cliques;
        (0..n).filter(|p| self.successors(p).contains(node)).collect()
    }
}

fn bench_tarjan(c: &mut Criterion) {
    let mut group = c.benchmark_group("tarjan");
    for cliques in [4, 16, 64] {
        let graph = RingOfCliques {
            clique_size: 8,
            cliques,
        };
        group.bench_with_input(BenchmarkId::from_parameter(cliques), &graph, |b, graph| {
            b.iter(|| tarjan(graph, 0));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tarjan);
criterion_main!(benches);
