//! The traversal engine that applies rules to plan trees.
//!
//! The tree is walked once, top-down. Rules come in two flavors:
//!
//! - *slot* rules (predicate pushdown, join elimination, predicate
//!   simplification) may put a different node into the slot they are applied
//!   at. A slot is settled by applying them until none fires.
//! - *edge* rules (projection pushdown) keep their projection in place and
//!   insert or narrow projections below it.
//!
//! Visiting a node settles each of its child slots, applies at most one edge
//! rule at the node, then descends into whatever children it has now. The
//! root slot is settled before the walk starts, and its final occupant is the
//! root of the result.

use common_config::VqlConfig;
use common_error::{VqlError, VqlResult};
use log::{debug, trace};
use vql_logical::validation::validate_plan;
use vql_logical::{NodeId, PlanTree};

use super::rule::{OptimizedPlan, RewriteRule, RuleId, RuleSet, RuleTrace, Transformed};

/// Configuration for the optimizer.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Whether to validate the plan before and after rewriting.
    pub validate: bool,
    /// Whether to enable detailed tracing.
    pub enable_trace: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            validate: true,
            enable_trace: false,
        }
    }
}

impl OptimizerConfig {
    /// Enable or disable plan validation.
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Enable or disable tracing.
    pub fn with_trace(mut self, enable: bool) -> Self {
        self.enable_trace = enable;
        self
    }
}

/// Rule-based optimizer for plan trees.
///
/// At each node, child slots are settled first with the slot rules (filter
/// over join, join elimination, predicate simplification, tried in that
/// order). Only then is one edge rule tried at the node itself: projection
/// over join before projection over filter.
pub struct Optimizer {
    /// Enabled rules that may replace the occupant of a slot.
    slot_rules: Vec<Box<dyn RewriteRule>>,
    /// Enabled rules that only insert below their anchor.
    edge_rules: Vec<Box<dyn RewriteRule>>,
    /// Configuration.
    config: OptimizerConfig,
}

impl Optimizer {
    /// Create an optimizer running the given rules.
    pub fn new(rules: &RuleSet) -> Self {
        Self::with_config(rules, OptimizerConfig::default())
    }

    /// Create an optimizer with custom config.
    pub fn with_config(rules: &RuleSet, config: OptimizerConfig) -> Self {
        let (slot_rules, edge_rules) = RuleId::ALL
            .into_iter()
            .filter(|id| rules.contains(*id))
            .partition::<Vec<_>, _>(RuleId::replaces_slot);

        Self {
            slot_rules: slot_rules.iter().map(RuleId::rule).collect(),
            edge_rules: edge_rules.iter().map(RuleId::rule).collect(),
            config,
        }
    }

    /// Build an optimizer from configuration, rejecting unknown rule names.
    pub fn from_config(config: &VqlConfig) -> VqlResult<Self> {
        let settings = &config.optimizer;
        let rules = RuleSet::parse(&settings.rules)?;
        let optimizer_config = OptimizerConfig::default()
            .with_validation(settings.validate)
            .with_trace(settings.trace);
        Ok(Self::with_config(&rules, optimizer_config))
    }

    /// Names of the enabled rules in the order they are tried: slot rules,
    /// then edge rules.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.slot_rules
            .iter()
            .chain(&self.edge_rules)
            .map(|rule| rule.name())
            .collect()
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize a plan tree in a single top-down pass.
    pub fn optimize(&self, plan: PlanTree) -> VqlResult<OptimizedPlan> {
        if self.config.validate {
            validate_plan(&plan)?;
        }

        let Some(root) = plan.root() else {
            return Ok(OptimizedPlan::new(plan));
        };

        let mut pass = Pass {
            optimizer: self,
            tree: plan,
            rules_applied: 0,
            trace: Vec::new(),
        };
        let root = pass.settle(root)?;
        pass.visit(root)?;

        debug!(
            "Optimization finished: {} rule applications, {} nodes",
            pass.rules_applied,
            pass.tree.len()
        );

        if self.config.validate {
            validate_plan(&pass.tree).map_err(|e| {
                VqlError::internal(format!("optimizer produced an invalid plan: {e}"))
            })?;
        }

        Ok(OptimizedPlan {
            plan: pass.tree,
            rules_applied: pass.rules_applied,
            trace: pass.trace,
        })
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(&RuleSet::all())
    }
}

/// State of one optimization run.
struct Pass<'a> {
    optimizer: &'a Optimizer,
    tree: PlanTree,
    rules_applied: usize,
    trace: Vec<RuleTrace>,
}

impl Pass<'_> {
    fn apply_rule(&mut self, rule: &dyn RewriteRule, node: NodeId) -> VqlResult<Transformed> {
        if !rule.matches(&self.tree, node) {
            return Ok(Transformed::no(node));
        }

        let before = self
            .optimizer
            .config
            .enable_trace
            .then(|| self.tree.explain());

        let result = rule.apply(&mut self.tree, node)?;

        if result.changed {
            self.rules_applied += 1;
            debug!("Rule '{}' applied at {}", rule.name(), node);

            if let Some(before) = before {
                self.trace.push(RuleTrace::new(
                    rule.name(),
                    node,
                    before,
                    self.tree.explain(),
                    true,
                ));
            }
        }

        Ok(result)
    }

    /// Apply slot rules to the occupant of a slot until none fires.
    ///
    /// Returns the final occupant.
    fn settle(&mut self, mut occupant: NodeId) -> VqlResult<NodeId> {
        let optimizer = self.optimizer;

        'settle: loop {
            trace!("Settling slot held by {}", occupant);
            if self.tree[occupant].produces_no_rows() {
                break;
            }
            for rule in &optimizer.slot_rules {
                let result = self.apply_rule(rule.as_ref(), occupant)?;
                if result.changed {
                    occupant = result.node;
                    continue 'settle;
                }
            }
            break;
        }

        Ok(occupant)
    }

    fn visit(&mut self, node: NodeId) -> VqlResult<()> {
        if self.tree[node].produces_no_rows() {
            return Ok(());
        }
        trace!("Visiting {} {}", node, self.tree[node].op().name());

        for child in self.tree[node].children().to_vec() {
            self.settle(child)?;
        }

        let optimizer = self.optimizer;
        for rule in &optimizer.edge_rules {
            if self.apply_rule(rule.as_ref(), node)?.changed {
                break;
            }
        }

        for child in self.tree[node].children().to_vec() {
            self.visit(child)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vql_core::ColumnSet;
    use vql_logical::{FilterNode, InnerJoinNode, ProjectionNode, col, lit};

    fn cols(columns: &[&str]) -> ColumnSet {
        ColumnSet::parse(columns.iter().copied()).unwrap()
    }

    /// `Projection [v1.1, v2.2] <- Filter v1.1 = 4 {v1, v2} <- InnerJoin(v1, v2)`
    fn filter_over_join() -> PlanTree {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let t2 = tree.scan("v2");
        let j = tree.join([t1, t2], InnerJoinNode::new(cols(&["v1.3", "v2.3"])));
        let s = tree.filter(
            j,
            FilterNode::new(col("v1", 1).eq(lit(4))).with_videos(["v1", "v2"].into_iter().collect()),
        );
        let p = tree.project(s, ProjectionNode::new(cols(&["v1.1", "v2.2"])));
        tree.set_root(p);
        tree
    }

    #[test]
    fn test_empty_rule_set_is_identity() {
        let tree = filter_over_join();
        let optimizer = Optimizer::new(&RuleSet::empty());

        let result = optimizer.optimize(tree.clone()).unwrap();
        assert_eq!(result.plan, tree);
        assert_eq!(result.rules_applied, 0);
        assert!(result.trace.is_empty());
    }

    #[test]
    fn test_rule_partition() {
        let optimizer = Optimizer::default();
        assert_eq!(
            optimizer.rule_names(),
            vec![
                "PREDICATE_PUSHDOWN",
                "JOIN_ELIMINATION",
                "SIMPLIFY_PREDICATE",
                "PROJECTION_PUSHDOWN_JOIN",
                "PROJECTION_PUSHDOWN_SELECT",
            ]
        );
        assert_eq!(optimizer.slot_rules.len(), 3);
        assert_eq!(optimizer.edge_rules.len(), 2);
    }

    #[test]
    fn test_optimizer_with_trace() {
        let rules = RuleSet::parse(["PREDICATE_PUSHDOWN"]).unwrap();
        let optimizer = Optimizer::with_config(&rules, OptimizerConfig::default().with_trace(true));

        let result = optimizer.optimize(filter_over_join()).unwrap();

        assert_eq!(result.rules_applied, 1);
        assert_eq!(result.trace.len(), 1);
        let entry = &result.trace[0];
        assert_eq!(entry.rule_name, "PREDICATE_PUSHDOWN");
        assert!(entry.before.starts_with("Projection [v1.1, v2.2] {v1, v2}\n└─ Filter"));
        assert!(entry.after.contains("└─ InnerJoin on [v1.3, v2.3]"));
        assert!(result.format_trace().contains("PREDICATE_PUSHDOWN"));
    }

    #[test]
    fn test_invalid_plan_rejected() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let p = tree.project(t1, ProjectionNode::new(cols(&["v2.1"])));
        tree.set_root(p);

        let err = Optimizer::default().optimize(tree.clone()).unwrap_err();
        assert!(matches!(err, VqlError::InvalidPlan(_)));

        // Without validation the plan is passed through.
        let unchecked =
            Optimizer::with_config(&RuleSet::all(), OptimizerConfig::default().with_validation(false));
        assert!(unchecked.optimize(tree).is_ok());
    }

    #[test]
    fn test_empty_plan() {
        let unchecked = Optimizer::with_config(
            &RuleSet::all(),
            OptimizerConfig::default().with_validation(false),
        );
        let result = unchecked.optimize(PlanTree::new()).unwrap();
        assert!(result.plan.root().is_none());

        assert!(Optimizer::default().optimize(PlanTree::new()).is_err());
    }

    #[test]
    fn test_from_config() {
        let config = VqlConfig::from_json(
            r#"{"optimizer": {"rules": ["SIMPLIFY_PREDICATE"], "trace": true}}"#,
        )
        .unwrap();
        let optimizer = Optimizer::from_config(&config).unwrap();
        assert_eq!(optimizer.rule_names(), vec!["SIMPLIFY_PREDICATE"]);
        assert!(optimizer.config().enable_trace);
        assert!(optimizer.config().validate);

        let config = VqlConfig::from_json(r#"{"optimizer": {"rules": ["JOIN_REORDER"]}}"#).unwrap();
        let err = Optimizer::from_config(&config).err().unwrap();
        assert!(matches!(err, VqlError::UnknownRule(ref name) if name == "JOIN_REORDER"));
    }

    #[test]
    fn test_no_rows_subtree_not_descended() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let t2 = tree.scan("v2");
        let j = tree.join([t1, t2], InnerJoinNode::new(cols(&["v1.3", "v2.3"])));
        let s = tree.filter(j, FilterNode::new(lit(1).eq(lit(0))));
        let p = tree.project(s, ProjectionNode::new(cols(&["v1.1"])));
        tree.set_root(p);

        let result = Optimizer::default().optimize(tree).unwrap();
        let plan = &result.plan;

        assert!(plan[s].produces_no_rows());
        assert!(plan[j].produces_no_rows());
        // Projection pushdown stopped at the filter.
        assert_eq!(plan[s].children(), &[j]);
        assert_eq!(plan[j].children(), &[t1, t2]);
    }
}
