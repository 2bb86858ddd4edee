//! Synthetic chart generators shared by the benchmarks.

use rscxml_chart::ChartDoc;
use serde_json::json;

/// A flat chain of `n` states, each moving to the next on `step`.
pub fn chain_chart(n: usize) -> ChartDoc {
    let states: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            if i + 1 < n {
                json!({
                    "id": format!("s{}", i),
                    "transitions": [{"event": "step", "target": [format!("s{}", i + 1)]}]
                })
            } else {
                json!({
                    "id": format!("s{}", i),
                    "transitions": [{"event": "step", "target": ["s0"]}]
                })
            }
        })
        .collect();

    ChartDoc::from_json(&json!({
        "name": format!("chain{}", n),
        "states": states
    }))
    .unwrap()
}

/// A parallel state with `regions` regions of `per_region` states each,
/// every region advancing on the shared `step` event.
pub fn parallel_chart(regions: usize, per_region: usize) -> ChartDoc {
    let region_nodes: Vec<serde_json::Value> = (0..regions)
        .map(|r| {
            let states: Vec<serde_json::Value> = (0..per_region)
                .map(|i| {
                    let next = (i + 1) % per_region;
                    json!({
                        "id": format!("r{}s{}", r, i),
                        "transitions": [{"event": "step", "target": [format!("r{}s{}", r, next)]}]
                    })
                })
                .collect();
            json!({"id": format!("r{}", r), "states": states})
        })
        .collect();

    ChartDoc::from_json(&json!({
        "name": format!("parallel{}x{}", regions, per_region),
        "states": [{"kind": "parallel", "id": "p", "states": region_nodes}]
    }))
    .unwrap()
}

/// Compounds nested `depth` levels deep, with a shallow history at every
/// level and an escape hatch at the top.
pub fn nested_chart(depth: usize) -> ChartDoc {
    fn level(current: usize, depth: usize) -> serde_json::Value {
        let inner = if current + 1 < depth {
            vec![
                json!({
                    "kind": "history",
                    "id": format!("h{}", current),
                    "transitions": [{"target": [format!("d{}", current + 1)]}]
                }),
                level(current + 1, depth),
                json!({"id": format!("alt{}", current)}),
            ]
        } else {
            vec![json!({"id": format!("leaf{}", current)})]
        };
        json!({"id": format!("d{}", current), "states": inner})
    }

    ChartDoc::from_json(&json!({
        "name": format!("nested{}", depth),
        "states": [
            level(0, depth),
            {"id": "outside", "transitions": [{"event": "back", "target": ["d0"]}]}
        ],
        "transitions": []
    }))
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rscxml_compiler::compile;

    #[test]
    fn test_generators_compile() {
        assert_eq!(compile(&chain_chart(8)).unwrap().root().nr_states(), 9);

        let parallel = compile(&parallel_chart(3, 4)).unwrap();
        // root + parallel + 3 regions + 12 leaves
        assert_eq!(parallel.root().nr_states(), 17);

        assert!(compile(&nested_chart(5)).is_ok());
    }
}
