//! Builds a small style chain, feeds it a top-styles list and walks through
//! a selection and a topology change.
//!
//! Run with `RUST_LOG=debug` to see routing and polling events.

use style_chain_core::{InputSocket, Node, OutputSocket, StyleGraph, Widget};
use style_chain_sync::{Channel, HostGraph, NodeId, StyleSync, SyncConfig};
use tracing_subscriber::EnvFilter;

fn styles_node(id: u64, channel: &str) -> Node {
    let mut node = Node::new(NodeId(id), "MyTop10Styles //ZImage")
        .with_input(InputSocket::new("input", "STRING"))
        .with_input(InputSocket::new("top_styles", "TOP_STYLES"))
        .with_output(OutputSocket::new("output", "STRING"))
        .with_widget(Widget::combo("output_to", channel, Channel::names(4)));
    for i in 1..=4 {
        node = node.with_widget(Widget::toggle(format!("style_{i}"), false));
    }
    node
}

fn print_chain(sync: &StyleSync<StyleGraph>, nodes: &[NodeId]) {
    for &id in nodes {
        let Some(node) = sync.graph().node(id) else {
            continue;
        };
        let slots: Vec<String> = node
            .widgets
            .iter()
            .filter(|w| w.name.starts_with("style_"))
            .map(|w| {
                let mark = if w.value.is_selected() { "x" } else { " " };
                format!("[{mark}] {}", w.display_label())
            })
            .collect();
        println!("  {id}: {}", slots.join("  "));
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let mut graph = StyleGraph::new();
    let editor = graph.add_node(
        Node::new(NodeId(10), "MyTop10StylesEditor //ZImage")
            .with_output(OutputSocket::new("TOP_STYLES", "TOP_STYLES"))
            .with_widget(Widget::new("style_1", "Film Noir"))
            .with_widget(Widget::new("style_2", "Anime"))
            .with_widget(Widget::new("style_3", "none")),
    )?;
    let a = graph.add_node(styles_node(1, "custom_1"))?;
    let b = graph.add_node(styles_node(2, "custom_1"))?;
    let c = graph.add_node(styles_node(3, "custom_2"))?;
    graph.connect(a, "output", b, "input")?;
    graph.connect(b, "output", c, "input")?;
    for consumer in [a, b, c] {
        graph.connect(editor, "TOP_STYLES", consumer, "top_styles")?;
    }

    let mut sync = StyleSync::with_config(graph, SyncConfig::fast());
    let attached = sync.attach_all();
    println!("attached {} controllers", attached.len());

    sync.observe_widgets(|e| println!("  widget {} {} = {} ({:?})", e.node, e.widget, e.value, e.origin));
    sync.observe_connections(|e| println!("  link {} {}: {:?} -> {:?}", e.node, e.slot, e.previous, e.origin));

    println!("first poll round:");
    sync.run_periodic_tasks();
    let chain = [a, b, c];
    print_chain(&sync, &chain);

    println!("select style 1 on {a}, then style 2 on {b}:");
    sync.select_style(a, 0)?;
    sync.select_style(b, 1)?;
    print_chain(&sync, &chain);

    println!("move {c} to channel custom_1:");
    sync.select_style(c, 1)?;
    sync.user_input(c, "output_to", "custom_1")?;
    print_chain(&sync, &chain);

    println!("rename editor slot 3:");
    sync.user_input(editor, "style_3", "Watercolor")?;
    print_chain(&sync, &chain);

    Ok(())
}
