#![allow(dead_code)]

use callscope::{Container, Context, Dependencies, Injectable, Registry, Scope};
use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;

struct A(Arc<B>, Arc<C>);
struct B(i32);
struct C(Arc<CA>);
struct CA(Arc<CAA>);
struct CAA;

struct Graph {
    a: Injectable<A>,
}

fn graph(with_dispose: bool) -> Graph {
    fn dispose<T: Send + Sync + 'static>(injectable: Injectable<T>, enabled: bool) -> Injectable<T> {
        if enabled {
            injectable.with_dispose(|_, _| async { Ok(()) })
        } else {
            injectable
        }
    }

    let caa = dispose(Injectable::factory(Scope::Call, Dependencies::new(), |_| async { Ok(CAA) }), with_dispose);
    let ca = dispose(
        Injectable::factory(Scope::Call, Dependencies::new().with("caa", &caa), |context: Context| async move {
            Ok(CA(context.get("caa")?))
        }),
        with_dispose,
    );
    let c = dispose(
        Injectable::factory(Scope::Call, Dependencies::new().with("ca", &ca), |context: Context| async move {
            Ok(C(context.get("ca")?))
        }),
        with_dispose,
    );
    let b = dispose(Injectable::factory(Scope::Global, Dependencies::new(), |_| async { Ok(B(2)) }), with_dispose);
    let a = dispose(
        Injectable::factory(
            Scope::Call,
            Dependencies::new().with("b", &b).with("c", &c),
            |context: Context| async move { Ok(A(context.get("b")?, context.get("c")?)) },
        ),
        with_dispose,
    );

    Graph { a }
}

#[inline]
fn container_fork(root: &Container) -> Container {
    root.fork(Scope::Connection).fork(Scope::Call)
}

#[inline]
async fn container_resolve(container: &Container, graph: &Graph) {
    let _ = container.resolve(&graph.a).await.unwrap();
}

#[inline]
async fn container_dispose(container: &Container, graph: &Graph) {
    container_resolve(container, graph).await;
    container.dispose().await;
}

fn criterion_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let root = Container::new(Registry::new());
    let graph_1 = graph(true);
    let graph_2 = graph(false);

    c.bench_function("container_fork", |b| b.iter(|| container_fork(&root)))
        .bench_function("container_resolve", |b| {
            b.to_async(&runtime).iter(|| async { container_resolve(&container_fork(&root), &graph_1).await })
        })
        .bench_function("container_resolve_with_cache", |b| {
            let container = container_fork(&root);
            b.to_async(&runtime).iter(|| container_resolve(&container, &graph_1))
        })
        .bench_function("container_dispose", |b| {
            b.to_async(&runtime).iter(|| async { container_dispose(&container_fork(&root), &graph_1).await })
        })
        .bench_function("container_dispose_without_finalizers", |b| {
            b.to_async(&runtime).iter(|| async { container_dispose(&container_fork(&root), &graph_2).await })
        });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
