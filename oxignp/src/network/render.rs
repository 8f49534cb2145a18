//! Human-readable renderings of networks and execution paths:
//! a one-line path summary and Graphviz `dot` graphs.
//!
//! Paths are looked up in the network they are rendered against.
//! Visits referring to subnodes the network no longer has (after a
//! re-decode) are rendered with a `?` in place of the missing data.
use super::{Network, Node};
use crate::individual::NodeEvaluation;

/// Renders an execution path on a single line, one entry per visit:
///
/// ```text
///    J 3 (sn    0, Q atExec =   0.000e0, Q =   1.250e0, f = IfFoodAhead    ) -->    P 1 (...)
/// ```
pub fn execution_path_string<S>(network: &Network<S>, path: &[NodeEvaluation]) -> String {
    path.iter()
        .map(|eval| {
            let subnode = network
                .nodes()
                .get(eval.node)
                .and_then(|node| node.subnodes().get(eval.subnode));
            let (q, name) = match subnode {
                Some(sub) => (format!("{:10.3e}", sub.q()), sub.name()),
                None => (format!("{:>10}", "?"), "?".to_string()),
            };
            format!(
                "{:>6} (sn {:>4}, Q atExec = {:10.3e}, Q = {}, f = {:<15})",
                format!("{} {}", eval.node_type.symbol(), eval.node),
                eval.subnode,
                eval.q_at_exec,
                q,
                name,
            )
        })
        .collect::<Vec<_>>()
        .join(" --> ")
}

/// Renders the whole network as a Graphviz digraph. Nodes are
/// records listing their subnodes and outcome branches; the start
/// node is drawn in blue.
pub fn network_dot<S>(network: &Network<S>) -> String {
    let mut out = String::from("digraph g {\nnode [shape=record] [style=rounded];");
    for node in network.nodes() {
        render_node(&mut out, network, node, None);
    }
    for node in network.nodes() {
        for branch in node.branches() {
            out.push_str(&format!(
                "\nn{}:b{} -> n{t}:n{t};",
                node.id(),
                branch.id(),
                t = branch.target()
            ));
        }
    }
    out.push_str("\n}");
    out
}

/// Renders the nodes visited by an execution path as a Graphviz
/// digraph. Each node shows subnode values and stars the branch
/// taken on its first visit; edges are numbered in visit order and
/// labelled with non-zero rewards.
pub fn execution_path_dot<S>(network: &Network<S>, path: &[NodeEvaluation]) -> String {
    let mut out = String::from("digraph g {\nnode [shape=record] [style=rounded];");
    let mut rendered = vec![false; network.nodes().len()];
    for eval in path {
        if let Some(node) = network.nodes().get(eval.node) {
            if !rendered[eval.node] {
                render_node(&mut out, network, node, Some(eval));
                rendered[eval.node] = true;
            }
        }
    }

    // The last visit's branch was never followed.
    let followed = path.len().saturating_sub(1);
    for (i, eval) in path[..followed].iter().enumerate() {
        let target = network
            .nodes()
            .get(eval.node)
            .and_then(|node| node.branch(eval.branch))
            .map(|branch| branch.target());
        let target = match target {
            Some(target) => target,
            None => continue,
        };
        let reward = match eval.result.reward {
            Some(r) if r != 0.0 => format!("(r{})", r),
            _ => String::new(),
        };
        out.push_str(&format!(
            "\nn{}:b{} -> n{t}:n{t} [label=<<FONT POINT-SIZE=\"10\">{}{}</FONT>>];",
            eval.node,
            eval.branch,
            i + 1,
            reward,
            t = target
        ));
    }
    out.push_str("\n}");
    out
}

fn render_node<S>(
    out: &mut String,
    network: &Network<S>,
    node: &Node<S>,
    visit: Option<&NodeEvaluation>,
) {
    out.push_str(&format!("\n n{}", node.id()));
    if node.id() == network.start_node() {
        out.push_str(" [color=blue]");
    }
    out.push_str(&format!(
        " [label=\"<n{id}> {}{id}",
        node.node_type().symbol(),
        id = node.id()
    ));
    for sub in node.subnodes() {
        let name = escape(&sub.name());
        match visit {
            Some(_) => out.push_str(&format!("| sn{} q={:10.3e}. {} |{{", sub.id(), sub.q(), name)),
            None => out.push_str(&format!("| sn{}. {} |{{", sub.id(), name)),
        }
        let branches = node.branches().iter().filter(|b| b.subnode() == sub.id());
        for (i, branch) in branches.enumerate() {
            if i > 0 {
                out.push('|');
            }
            let taken = visit.map_or(false, |v| v.branch == branch.id());
            let outcome = sub.function().branches().name(i).unwrap_or("?");
            out.push_str(&format!(
                "<b{}> {}{} {}",
                branch.id(),
                if taken { "* " } else { "" },
                escape(outcome),
                branch.target()
            ));
        }
        out.push('}');
    }
    out.push_str("\"];");
}

/// Escapes characters with a meaning in record labels.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
