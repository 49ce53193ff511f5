//! Rewrite rule trait, rule catalog and optimization results.
//!
//! Every rule in the catalog has a stable upper-case name used by
//! configuration (`PREDICATE_PUSHDOWN`, ...). A [`RuleSet`] is the ordered,
//! duplicate-free selection a caller enables for one optimizer.

use std::fmt;
use std::str::FromStr;

use common_display::indent;
use common_error::{VqlError, VqlResult};
use vql_logical::{NodeId, PlanTree};

use super::{
    JoinElimination, PredicatePushdown, ProjectionPushdownJoin, ProjectionPushdownSelect,
    SimplifyPredicate,
};

/// Identifier of a rule in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleId {
    /// Projection over join: per-branch projections below the join.
    ProjectionPushdownJoin,
    /// Projection over filter: a projection below the filter.
    ProjectionPushdownSelect,
    /// Filter over join: move the filter next to the branch it constrains.
    PredicatePushdown,
    /// Drop a join made redundant by a foreign key.
    JoinElimination,
    /// Fold constant predicates.
    SimplifyPredicate,
}

impl RuleId {
    /// Every rule, in matching priority order.
    pub const ALL: [RuleId; 5] = [
        Self::ProjectionPushdownJoin,
        Self::ProjectionPushdownSelect,
        Self::PredicatePushdown,
        Self::JoinElimination,
        Self::SimplifyPredicate,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProjectionPushdownJoin => "PROJECTION_PUSHDOWN_JOIN",
            Self::ProjectionPushdownSelect => "PROJECTION_PUSHDOWN_SELECT",
            Self::PredicatePushdown => "PREDICATE_PUSHDOWN",
            Self::JoinElimination => "JOIN_ELIMINATION",
            Self::SimplifyPredicate => "SIMPLIFY_PREDICATE",
        }
    }

    /// Whether the rule may change which node occupies the slot it is
    /// applied to. Other rules only insert nodes below their anchor.
    pub const fn replaces_slot(&self) -> bool {
        matches!(
            self,
            Self::PredicatePushdown | Self::JoinElimination | Self::SimplifyPredicate
        )
    }

    /// Instantiate the rule.
    pub fn rule(&self) -> Box<dyn RewriteRule> {
        match self {
            Self::ProjectionPushdownJoin => Box::new(ProjectionPushdownJoin),
            Self::ProjectionPushdownSelect => Box::new(ProjectionPushdownSelect),
            Self::PredicatePushdown => Box::new(PredicatePushdown),
            Self::JoinElimination => Box::new(JoinElimination),
            Self::SimplifyPredicate => Box::new(SimplifyPredicate),
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RuleId {
    type Err = VqlError;

    fn from_str(s: &str) -> VqlResult<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| VqlError::unknown_rule(s))
    }
}

/// Ordered, duplicate-free set of enabled rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet(Vec<RuleId>);

impl RuleSet {
    /// The empty set: optimization is the identity.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every rule in the catalog.
    pub fn all() -> Self {
        RuleId::ALL.into_iter().collect()
    }

    /// Resolve rule names, rejecting any name outside the catalog.
    pub fn parse<I, S>(names: I) -> VqlResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| name.as_ref().parse::<RuleId>())
            .collect()
    }

    pub fn insert(&mut self, id: RuleId) -> bool {
        if self.0.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    pub fn contains(&self, id: RuleId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<RuleId> for RuleSet {
    fn from_iter<T: IntoIterator<Item = RuleId>>(iter: T) -> Self {
        let mut set = Self::default();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.0.iter().map(RuleId::name).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

/// A rewrite rule applied at one node of a plan tree.
///
/// The anchor is the upper node of the rule's pattern: the filter for
/// predicate pushdown, the projection for projection pushdown, and so on.
/// A rule that does not apply returns [`Transformed::no`]; errors are
/// reserved for broken contracts.
pub trait RewriteRule: Send + Sync {
    fn id(&self) -> RuleId;

    /// Get the name of this rule.
    fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Get a description of what this rule does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Cheap node-kind test for the rule's pattern at `node`.
    fn matches(&self, tree: &PlanTree, node: NodeId) -> bool;

    /// Rewrite the neighborhood of `node` in place.
    fn apply(&self, tree: &mut PlanTree, node: NodeId) -> VqlResult<Transformed>;
}

/// The result of applying a rewrite rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformed {
    /// The node now occupying the anchor's former slot.
    pub node: NodeId,
    /// Whether the tree was actually changed.
    pub changed: bool,
}

impl Transformed {
    /// Create a new transformed result indicating the tree was changed.
    pub fn yes(node: NodeId) -> Self {
        Self {
            node,
            changed: true,
        }
    }

    /// Create a new transformed result indicating the tree was unchanged.
    pub fn no(node: NodeId) -> Self {
        Self {
            node,
            changed: false,
        }
    }
}

/// A trace entry for a single rule application.
#[derive(Debug, Clone)]
pub struct RuleTrace {
    /// The name of the rule that was applied.
    pub rule_name: String,
    /// The anchor node the rule was applied at.
    pub node: NodeId,
    /// The plan before the rule was applied (as explain string).
    pub before: String,
    /// The plan after the rule was applied (as explain string).
    pub after: String,
    /// Whether the rule actually changed the plan.
    pub changed: bool,
}

impl RuleTrace {
    /// Create a new trace entry.
    pub fn new(
        rule_name: impl Into<String>,
        node: NodeId,
        before: impl Into<String>,
        after: impl Into<String>,
        changed: bool,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            node,
            before: before.into(),
            after: after.into(),
            changed,
        }
    }
}

/// The result of optimization with optional trace information.
#[derive(Debug, Clone)]
pub struct OptimizedPlan {
    /// The final optimized plan.
    pub plan: PlanTree,
    /// Number of rule applications that changed the plan.
    pub rules_applied: usize,
    /// Detailed trace of rule applications (if tracing was enabled).
    pub trace: Vec<RuleTrace>,
}

impl OptimizedPlan {
    /// Create a new optimized plan result.
    pub fn new(plan: PlanTree) -> Self {
        Self {
            plan,
            rules_applied: 0,
            trace: Vec::new(),
        }
    }

    /// Format the trace as a human-readable string.
    pub fn format_trace(&self) -> String {
        let mut output = format!("Optimization completed, {} rules applied\n", self.rules_applied);

        if self.trace.is_empty() {
            output.push_str("  (no trace available)\n");
        } else {
            for (i, entry) in self.trace.iter().filter(|t| t.changed).enumerate() {
                output.push_str(&format!(
                    "\n--- Rule {} applied: {} at {} ---\n",
                    i + 1,
                    entry.rule_name,
                    entry.node
                ));
                output.push_str("Before:\n");
                output.push_str(&indent(&entry.before, "  "));
                output.push_str("\nAfter:\n");
                output.push_str(&indent(&entry.after, "  "));
                output.push('\n');
            }
        }

        output
    }
}
