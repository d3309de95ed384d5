// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use budget_alloc_model::fixtures::university_scenario;
use budget_alloc_solver::prelude::*;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn bench_genetic(c: &mut Criterion) {
    let problem = university_scenario();
    let solver = GeneticSolver::new(
        GeneticConfig::default()
            .with_generations(100)
            .with_seed(Some(42)),
    )
    .expect("valid config");

    c.bench_function("GeneticSolver solve (scenario, 100 generations)", |b| {
        b.iter(|| {
            let out = solver.solve(black_box(&problem));
            assert!(out.best.is_within_budget(problem.budget()));
            black_box(out);
        });
    });
}

fn bench_exact(c: &mut Criterion) {
    let problem = university_scenario();
    let solver = ExactSolver::default();

    c.bench_function("ExactSolver solve (scenario)", |b| {
        b.iter(|| black_box(solver.solve(black_box(&problem)).expect("solvable")));
    });
}

fn bench_subsets(c: &mut Criterion) {
    let problem = university_scenario();
    let search = SubsetSearch::new(2, SubsetEvaluator::Exact(ExactSolver::default()));

    c.bench_function("SubsetSearch exact (scenario, k = 2)", |b| {
        b.iter(|| black_box(search.search(black_box(&problem)).expect("valid search")));
    });
}

criterion_group!(benches, bench_genetic, bench_exact, bench_subsets);
criterion_main!(benches);
