//! Tree rendering for nested nodes.

use std::fmt;

/// A node that can be rendered as part of a tree.
pub trait TreeNode {
    /// Short label for this node.
    fn label(&self) -> String;

    /// Child nodes, in display order.
    fn children(&self) -> Vec<&dyn TreeNode>;

    /// Additional details shown in parentheses after the label.
    fn details(&self) -> Option<String> {
        None
    }
}

/// Renders a [`TreeNode`] with box-drawing connectors.
pub struct DisplayTree<'a> {
    root: &'a dyn TreeNode,
}

impl<'a> DisplayTree<'a> {
    /// Create a new display tree.
    pub fn new(root: &'a dyn TreeNode) -> Self {
        Self { root }
    }

    fn write_line(f: &mut fmt::Formatter<'_>, node: &dyn TreeNode) -> fmt::Result {
        write!(f, "{}", node.label())?;
        if let Some(details) = node.details() {
            write!(f, " ({details})")?;
        }
        writeln!(f)
    }

    fn fmt_children(f: &mut fmt::Formatter<'_>, node: &dyn TreeNode, prefix: &str) -> fmt::Result {
        let children = node.children();
        let last = children.len().saturating_sub(1);
        for (i, child) in children.into_iter().enumerate() {
            let (connector, continuation) = if i == last {
                ("└─ ", "   ")
            } else {
                ("├─ ", "│  ")
            };
            write!(f, "{prefix}{connector}")?;
            Self::write_line(f, child)?;
            Self::fmt_children(f, child, &format!("{prefix}{continuation}"))?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_line(f, self.root)?;
        Self::fmt_children(f, self.root, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        label: &'static str,
        children: Vec<TestNode>,
    }

    impl TreeNode for TestNode {
        fn label(&self) -> String {
            self.label.to_string()
        }

        fn children(&self) -> Vec<&dyn TreeNode> {
            self.children.iter().map(|c| c as &dyn TreeNode).collect()
        }
    }

    fn leaf(label: &'static str) -> TestNode {
        TestNode {
            label,
            children: vec![],
        }
    }

    #[test]
    fn test_display_tree() {
        let tree = TestNode {
            label: "Add",
            children: vec![
                TestNode {
                    label: "Mul",
                    children: vec![leaf("a"), leaf("b")],
                },
                leaf("c"),
            ],
        };

        let output = DisplayTree::new(&tree).to_string();
        let expected = "Add\n├─ Mul\n│  ├─ a\n│  └─ b\n└─ c\n";
        assert_eq!(output, expected);
    }
}
