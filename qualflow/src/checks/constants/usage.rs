//! Qualifier usage check.
//!
//! Runs the fixed-point engine over routine bodies with the fenum qualifier
//! lattice and reports operations that mix values of different groups:
//!
//! - `binary.type.incompatible`: a binary operation (other than string
//!   concatenation) whose operand qualifiers are incomparable
//! - `switch.type.incompatible`: a case label whose qualifier is not below
//!   the scrutinee's
//! - `assignment.type.incompatible`: a field assignment whose value is not
//!   below the field's declared qualifier
//!
//! Equality tests refine the tested local: after `x == Color.RED` succeeds,
//! `x` carries `@Fenum("Color")`.

use super::qualifier::{describe, unqualified, FenumQualifier, FenumValue};
use crate::dataflow::{
    AnalysisResult, EngineConfig, FixpointEngine, Store, TransferFunction, TransferInput,
    TransferResult,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::lattice::{AbstractValue, Lattice, UnderlyingType};
use crate::program::{Declaration, Routine};
use log::debug;
use qualflow_cfg::{BinaryOp, Entity, Literal, Node, NodeId, NodeKind, UnaryOp};
use std::collections::BTreeMap;

/// A misuse found while transferring one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageViolation {
    pub kind: DiagnosticKind,
    pub args: Vec<String>,
}

impl UsageViolation {
    fn new(kind: DiagnosticKind, first: &FenumValue, second: &FenumValue) -> Self {
        Self {
            kind,
            args: vec![describe(first), describe(second)],
        }
    }
}

/// Declared type and qualifier of every known field, by `(owner, name)`.
#[derive(Debug, Clone, Default)]
pub struct FieldTable {
    fields: BTreeMap<(String, String), FenumValue>,
}

impl FieldTable {
    pub fn register(&mut self, declaration: &Declaration) {
        for field in &declaration.fields {
            let value = AbstractValue::new(
                field.underlying.clone(),
                FenumQualifier::from_group(field.qualifier.as_deref()),
            );
            self.fields
                .insert((declaration.name.clone(), field.name.clone()), value);
        }
    }

    /// The declared value of `owner.name`; `this` resolves to `current`.
    pub fn lookup(&self, current: &str, owner: &str, name: &str) -> Option<&FenumValue> {
        let owner = if owner == "this" { current } else { owner };
        self.fields.get(&(owner.to_string(), name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Transfer function of the qualifier usage analysis.
#[derive(Debug)]
pub struct FenumTransfer<'a> {
    fields: &'a FieldTable,
    /// Declaration whose routine is analysed
    current: &'a str,
}

impl<'a> FenumTransfer<'a> {
    pub fn new(fields: &'a FieldTable, current: &'a str) -> Self {
        Self { fields, current }
    }

    fn declared(&self, entity: &Entity) -> Option<&'a FenumValue> {
        match entity {
            Entity::Field { owner, name } => self.fields.lookup(self.current, owner, name),
            _ => None,
        }
    }

    fn read(&self, store: &Store<FenumValue>, entity: &Entity) -> FenumValue {
        match store.get(entity) {
            Some(value) => value.clone(),
            None => self.declared(entity).cloned().unwrap_or_else(FenumValue::top),
        }
    }

    fn literal(literal: &Literal) -> FenumValue {
        match literal {
            Literal::Int(_) => unqualified(UnderlyingType::Int),
            Literal::Text(_) => unqualified(UnderlyingType::Text),
            Literal::Bool(_) => unqualified(UnderlyingType::Bool),
            Literal::Null => FenumValue::bottom_of(UnderlyingType::Reference("null".to_string())),
        }
    }

    /// The local or expression a node reads, if it is a refinable read.
    fn refinable(input: &TransferInput<'_, FenumValue>, node: NodeId) -> Option<Entity> {
        match &input.graph().node(node).kind {
            NodeKind::Read(entity @ (Entity::Local(_) | Entity::Expr(_))) => Some(entity.clone()),
            _ => None,
        }
    }

    fn binary(
        &self,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
        input: &TransferInput<'_, FenumValue>,
    ) -> TransferResult<FenumValue, UsageViolation> {
        let store = input.store().clone();
        let left = input.value_of(lhs);
        let right = input.value_of(rhs);

        let value = if op.is_comparison() || op.is_logical() {
            unqualified(UnderlyingType::Bool)
        } else if op == BinaryOp::Concat {
            unqualified(UnderlyingType::Text)
        } else {
            left.join(&right)
        };

        let mut result = if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let mut refined = store.clone();
            for (operand, other) in [(lhs, &right), (rhs, &left)] {
                if other.qualifier().group().is_none() {
                    continue;
                }
                if let Some(entity) = Self::refinable(input, operand) {
                    let current = refined.value_of(&entity);
                    let narrowed = match current.underlying() {
                        Some(underlying) => AbstractValue::new(underlying.clone(), other.qualifier()),
                        None => other.clone(),
                    };
                    refined.set(entity, narrowed);
                }
            }
            if op == BinaryOp::Eq {
                TransferResult::conditional(refined, store.clone())
            } else {
                TransferResult::conditional(store.clone(), refined)
            }
        } else {
            TransferResult::regular(store.clone())
        };

        if op != BinaryOp::Concat && !left.qualifier().is_comparable(&right.qualifier()) {
            result = result.with_fact(UsageViolation::new(
                DiagnosticKind::BinaryTypeIncompatible,
                &left,
                &right,
            ));
        }
        if op.may_throw() {
            result = result.with_exceptional(store);
        }
        result.with_value(value)
    }
}

impl TransferFunction<FenumValue> for FenumTransfer<'_> {
    type Fact = UsageViolation;

    fn transfer(
        &mut self,
        node: &Node,
        input: &TransferInput<'_, FenumValue>,
    ) -> TransferResult<FenumValue, UsageViolation> {
        let mut store = input.store().clone();
        match &node.kind {
            NodeKind::Literal(literal) => {
                TransferResult::regular(store).with_value(Self::literal(literal))
            }
            NodeKind::Read(entity) => {
                let value = self.read(&store, entity);
                TransferResult::regular(store).with_value(value)
            }
            NodeKind::Assign { target, value } => {
                let assigned = input.value_of(*value);
                let violation = self.declared(target).and_then(|declared| {
                    (!assigned.qualifier().leq(&declared.qualifier())).then(|| {
                        UsageViolation::new(
                            DiagnosticKind::AssignmentTypeIncompatible,
                            &assigned,
                            declared,
                        )
                    })
                });
                store.set(target.clone(), assigned.clone());
                let mut result = TransferResult::regular(store).with_value(assigned);
                if let Some(violation) = violation {
                    result = result.with_fact(violation);
                }
                result
            }
            NodeKind::ArrayLoad { .. } => {
                let thrown = store.clone();
                TransferResult::regular(store)
                    .with_exceptional(thrown)
                    .with_value(FenumValue::top())
            }
            NodeKind::ArrayStore { .. } => {
                let thrown = store.clone();
                TransferResult::regular(store).with_exceptional(thrown)
            }
            NodeKind::Binary { op, lhs, rhs } => self.binary(*op, *lhs, *rhs, input),
            NodeKind::Unary { op, operand } => {
                let value = match op {
                    UnaryOp::Not => unqualified(UnderlyingType::Bool),
                    UnaryOp::Neg | UnaryOp::BitNot => input.value_of(*operand),
                };
                TransferResult::regular(store).with_value(value)
            }
            NodeKind::Call { .. } => {
                store.invalidate_fields();
                let thrown = store.clone();
                TransferResult::regular(store)
                    .with_exceptional(thrown)
                    .with_value(FenumValue::top())
            }
            NodeKind::New { class, .. } => {
                let thrown = store.clone();
                TransferResult::regular(store)
                    .with_exceptional(thrown)
                    .with_value(unqualified(UnderlyingType::Reference(class.clone())))
            }
            NodeKind::Case { scrutinee, label } => {
                let switched = input.value_of(*scrutinee);
                let case = input.value_of(*label);
                let mut result =
                    TransferResult::regular(store).with_value(unqualified(UnderlyingType::Bool));
                if !case.qualifier().leq(&switched.qualifier()) {
                    result = result.with_fact(UsageViolation::new(
                        DiagnosticKind::SwitchTypeIncompatible,
                        &case,
                        &switched,
                    ));
                }
                result
            }
            NodeKind::Catch {
                parameter,
                exception,
            } => {
                let class = exception.clone().unwrap_or_else(|| "Throwable".to_string());
                store.set(
                    Entity::local(parameter.as_str()),
                    unqualified(UnderlyingType::Reference(class)),
                );
                TransferResult::regular(store)
            }
            NodeKind::Return { .. } => TransferResult::regular(store),
            NodeKind::Throw { .. } => TransferResult::regular(Store::Bottom).with_exceptional(store),
        }
    }
}

/// Drives [`FenumTransfer`] over the routines of a run.
#[derive(Debug, Default)]
pub struct QualifierUsageCheck {
    fields: FieldTable,
    engine: FixpointEngine,
}

impl QualifierUsageCheck {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            fields: FieldTable::default(),
            engine: FixpointEngine::new(config),
        }
    }

    /// Makes the fields of `declaration` known to later routine checks.
    pub fn register_declaration(&mut self, declaration: &Declaration) {
        self.fields.register(declaration);
    }

    pub fn fields(&self) -> &FieldTable {
        &self.fields
    }

    /// Analyses `routine` and reports every violation in a reachable node.
    ///
    /// Returns `None` for routines without a body.
    pub fn check_routine(
        &self,
        declaration: &str,
        routine: &Routine,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<AnalysisResult<FenumValue, UsageViolation>> {
        let graph = routine.body.as_ref()?;

        let mut initial = Store::new();
        for param in &routine.params {
            initial.set(
                Entity::local(param.name.as_str()),
                AbstractValue::new(
                    param.underlying.clone(),
                    FenumQualifier::from_group(param.qualifier.as_deref()),
                ),
            );
        }

        let mut transfer = FenumTransfer::new(&self.fields, declaration);
        let result = self.engine.analyze(graph, initial, &mut transfer);

        let context = format!("{}.{}", declaration, routine.signature());
        for (node, violation) in result.all_facts() {
            let mut diagnostic = Diagnostic::new(violation.kind, graph.node(node).span)
                .with_context(context.as_str());
            diagnostic.args = violation.args.clone();
            sink.report(diagnostic);
        }
        debug!(
            "qualifier usage of {}: {} violations",
            context,
            result.all_facts().count()
        );
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticsCollector;
    use crate::program::{FieldDecl, Param, PatternPolicy};
    use qualflow_cfg::{BlockId, CfgBuilder, ControlFlowGraph};
    use test_log::test;

    fn colors() -> Declaration {
        let mut decl = Declaration::new("Color");
        let u = PatternPolicy::Unconstrained;
        decl.fields.push(FieldDecl::constant("RED", "Color", u, Literal::Int(0)));
        decl.fields.push(FieldDecl::constant("GREEN", "Color", u, Literal::Int(1)));
        decl.fields.push(FieldDecl::constant("SMALL", "Size", u, Literal::Int(0)));
        let mut current = FieldDecl::constant("current", "Color", u, Literal::Int(0));
        current.modifiers.is_final = false;
        decl.fields.push(current);
        decl
    }

    fn check() -> QualifierUsageCheck {
        let mut check = QualifierUsageCheck::new(EngineConfig::default());
        check.register_declaration(&colors());
        check
    }

    fn constant(b: &mut CfgBuilder, block: BlockId, name: &str) -> NodeId {
        b.push(block, NodeKind::Read(Entity::field("Color", name)))
    }

    fn run(
        graph: ControlFlowGraph,
        params: Vec<Param>,
    ) -> (DiagnosticsCollector, AnalysisResult<FenumValue, UsageViolation>) {
        let routine = Routine {
            params,
            ..Routine::new("f").with_body(graph)
        };
        let mut sink = DiagnosticsCollector::new();
        let result = check().check_routine("Color", &routine, &mut sink).unwrap();
        (sink, result)
    }

    fn binary(
        b: &mut CfgBuilder,
        block: BlockId,
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> NodeId {
        b.push(block, NodeKind::Binary { op, lhs, rhs })
    }

    #[test]
    fn test_constant_read_carries_group() {
        let mut b = CfgBuilder::new("f");
        let entry = b.entry();
        let red = constant(&mut b, entry, "RED");
        let exit = b.exit();
        b.goto(entry, exit);

        let (sink, result) = run(b.build().unwrap(), vec![]);
        assert!(sink.is_empty());
        assert_eq!(
            result.value(red).map(FenumValue::qualifier),
            Some(FenumQualifier::fenum("Color"))
        );
    }

    #[test]
    fn test_binary_mixing_groups_is_reported() {
        let mut b = CfgBuilder::new("f");
        let entry = b.entry();
        let red = constant(&mut b, entry, "RED");
        let small = constant(&mut b, entry, "SMALL");
        binary(&mut b, entry, BinaryOp::Add, red, small);
        let green = constant(&mut b, entry, "GREEN");
        binary(&mut b, entry, BinaryOp::Add, red, green);
        let exit = b.exit();
        b.goto(entry, exit);

        let (sink, _) = run(b.build().unwrap(), vec![]);
        assert_eq!(sink.len(), 1);
        let diagnostic = &sink.diagnostics()[0];
        assert_eq!(diagnostic.kind, DiagnosticKind::BinaryTypeIncompatible);
        assert_eq!(diagnostic.args, vec!["@Fenum(\"Color\") int", "@Fenum(\"Size\") int"]);
        assert_eq!(diagnostic.context.as_deref(), Some("Color.f()"));
    }

    #[test]
    fn test_string_concatenation_is_exempt() {
        let mut b = CfgBuilder::new("f");
        let entry = b.entry();
        let red = constant(&mut b, entry, "RED");
        let text = b.push(entry, NodeKind::Literal(Literal::Text("x".to_string())));
        binary(&mut b, entry, BinaryOp::Concat, text, red);
        let exit = b.exit();
        b.goto(entry, exit);

        let (sink, _) = run(b.build().unwrap(), vec![]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_switch_case_outside_group() {
        let mut b = CfgBuilder::new("f");
        let entry = b.entry();
        let scrutinee = b.push(entry, NodeKind::Read(Entity::local("c")));
        let small = constant(&mut b, entry, "SMALL");
        b.push(entry, NodeKind::Case { scrutinee, label: small });
        let matched = b.block();
        let next = b.block();
        b.branch(entry, matched, next);
        let green = constant(&mut b, next, "GREEN");
        b.push(next, NodeKind::Case { scrutinee, label: green });
        let other = b.block();
        let exit = b.exit();
        b.branch(next, other, exit);
        b.goto(matched, exit);
        b.goto(other, exit);

        let params = vec![Param {
            name: "c".to_string(),
            underlying: UnderlyingType::Int,
            qualifier: Some("Color".to_string()),
        }];
        let (sink, _) = run(b.build().unwrap(), params);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.diagnostics()[0].kind, DiagnosticKind::SwitchTypeIncompatible);
    }

    #[test]
    fn test_field_assignment_outside_group() {
        let mut b = CfgBuilder::new("f");
        let entry = b.entry();
        let seven = b.push(entry, NodeKind::Literal(Literal::Int(7)));
        b.push(
            entry,
            NodeKind::Assign {
                target: Entity::field("this", "current"),
                value: seven,
            },
        );
        let green = constant(&mut b, entry, "GREEN");
        b.push(
            entry,
            NodeKind::Assign {
                target: Entity::field("Color", "current"),
                value: green,
            },
        );
        let exit = b.exit();
        b.goto(entry, exit);

        let (sink, _) = run(b.build().unwrap(), vec![]);
        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.diagnostics()[0].kind,
            DiagnosticKind::AssignmentTypeIncompatible
        );
    }

    #[test]
    fn test_equality_refines_local_on_true_branch() {
        // if (x == Color.RED) { x + Color.GREEN } else { x + Color.GREEN }
        let mut b = CfgBuilder::new("f");
        let entry = b.entry();
        let x = b.push(entry, NodeKind::Read(Entity::local("x")));
        let red = constant(&mut b, entry, "RED");
        binary(&mut b, entry, BinaryOp::Eq, x, red);
        let then_block = b.block();
        let else_block = b.block();
        let exit = b.exit();
        b.branch(entry, then_block, else_block);
        for block in [then_block, else_block] {
            let x = b.push(block, NodeKind::Read(Entity::local("x")));
            let green = constant(&mut b, block, "GREEN");
            binary(&mut b, block, BinaryOp::Add, x, green);
            b.goto(block, exit);
        }

        let params = vec![Param {
            name: "x".to_string(),
            underlying: UnderlyingType::Int,
            qualifier: None,
        }];
        let (sink, result) = run(b.build().unwrap(), params);
        assert_eq!(
            result.block_input(then_block).value_of(&Entity::local("x")).qualifier(),
            FenumQualifier::fenum("Color")
        );
        // the comparison itself and the unrefined else branch mix groups
        assert_eq!(sink.of_kind(DiagnosticKind::BinaryTypeIncompatible).count(), 2);
    }

    #[test]
    fn test_loop_carried_qualifier_reaches_later_block() {
        // x = null; loop { v = x; x = Color.RED; if (flag == 1) { v + Color.SMALL } }
        let mut b = CfgBuilder::new("f");
        let entry = b.entry();
        let null = b.push(entry, NodeKind::Literal(Literal::Null));
        b.push(
            entry,
            NodeKind::Assign {
                target: Entity::local("x"),
                value: null,
            },
        );
        let head = b.block();
        b.goto(entry, head);

        let v = b.push(head, NodeKind::Read(Entity::local("x")));
        let red = constant(&mut b, head, "RED");
        b.push(
            head,
            NodeKind::Assign {
                target: Entity::local("x"),
                value: red,
            },
        );
        let flag = b.push(head, NodeKind::Read(Entity::local("flag")));
        let one = b.push(head, NodeKind::Literal(Literal::Int(1)));
        binary(&mut b, head, BinaryOp::Eq, flag, one);
        let body = b.block();
        let exit = b.exit();
        b.branch(head, body, exit);

        let small = constant(&mut b, body, "SMALL");
        binary(&mut b, body, BinaryOp::Add, v, small);
        b.goto(body, head);

        let (sink, result) = run(b.build().unwrap(), vec![]);
        assert_eq!(
            result.value(v).map(FenumValue::qualifier),
            Some(FenumQualifier::fenum("Color"))
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.diagnostics()[0].kind, DiagnosticKind::BinaryTypeIncompatible);
    }

    #[test]
    fn test_call_forgets_fields_and_catch_binds_unqualified() {
        let mut b = CfgBuilder::new("f");
        let entry = b.entry();
        let red = constant(&mut b, entry, "RED");
        b.push(
            entry,
            NodeKind::Assign {
                target: Entity::field("Color", "current"),
                value: red,
            },
        );
        let call = b.push(
            entry,
            NodeKind::Call {
                callee: "g".to_string(),
                receiver: None,
                args: vec![],
            },
        );
        let handler = b.block();
        b.push(
            handler,
            NodeKind::Catch {
                parameter: "e".to_string(),
                exception: None,
            },
        );
        let exit = b.exit();
        b.goto(entry, exit);
        b.exceptional(entry, handler);
        b.goto(handler, exit);

        let (sink, result) = run(b.build().unwrap(), vec![]);
        assert!(sink.is_empty());
        let current = Entity::field("Color", "current");
        assert!(result.store_before(call).get(&current).is_some());
        assert!(result.store_after(call).get(&current).is_none());
        assert_eq!(
            result.normal_exit(handler).value_of(&Entity::local("e")).qualifier(),
            FenumQualifier::unqualified()
        );
    }

    #[test]
    fn test_bodiless_routine_is_skipped() {
        let mut sink = DiagnosticsCollector::new();
        assert!(check()
            .check_routine("Color", &Routine::new("native"), &mut sink)
            .is_none());
        assert!(sink.is_empty());
    }
}
