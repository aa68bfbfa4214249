//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives the lowering
//! pass from a checked syntax tree to an LLVM module. It owns the LLVM module
//! and builder, maps the type model onto IR types, and keeps the stack slots
//! backing every variable.

use std::collections::HashMap;

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    targets::{
        CodeModel, InitializationConfig, RelocMode, Target, TargetMachine, TargetTriple,
    },
    types::{AnyType, BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType, StructType},
    values::{BasicValueEnum, FunctionValue, IntValue, PointerValue},
    AddressSpace, IntPredicate, OptimizationLevel,
};

use crate::{
    ast::ast::{NodeId, Program},
    config::{CompilerConfig, TargetSelection},
    errors::diagnostics::{CodegenError, Diagnostics},
    type_checker::{
        scope::{StorageSlot, SymbolId},
        type_checker::Analysis,
        types::{InvokeType, SumType, Type},
    },
    Position,
};

use super::stmt::lower_statement;

/// Size in bytes of a pointer inside a sum payload.
const POINTER_SIZE: u32 = 8;

/// A stack cell backing a variable.
#[derive(Debug, Clone)]
pub struct Slot<'a> {
    pub pointer: PointerValue<'a>,
    pub ir_type: BasicTypeEnum<'a>,
    /// Type of the last value written.
    pub ty: Type,
}

/// The lowering state for one compilation unit.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the LLVM context
/// * `'u` - Lifetime of the unit's analysis and configuration
pub struct Compiler<'a, 'u> {
    /// Reference to the LLVM context
    pub context: &'a Context,
    /// The LLVM module being built
    pub module: Module<'a>,
    /// The LLVM IR builder
    pub builder: Builder<'a>,

    pub config: &'u CompilerConfig,
    /// What the checker proved; symbols receive their storage here.
    pub analysis: &'u mut Analysis,
    pub diagnostics: Diagnostics,

    /// Indexed by [`StorageSlot`].
    pub slots: Vec<Slot<'a>>,
    /// Every function symbol lowered or declared so far.
    pub functions: HashMap<SymbolId, FunctionValue<'a>>,
    /// Literal cells of the current function, by integer width.
    pub literal_cells: HashMap<u32, PointerValue<'a>>,
    pub current_function: Option<FunctionValue<'a>>,
    /// Declared return type of the current function, `None` in `main`.
    pub current_return: Option<Type>,
    /// Node being lowered, reported when lowering fails.
    pub position: Position,

    boolean_strings: Option<(PointerValue<'a>, PointerValue<'a>)>,
}

impl<'a, 'u> Compiler<'a, 'u> {
    pub fn new(
        context: &'a Context,
        analysis: &'u mut Analysis,
        config: &'u CompilerConfig,
    ) -> Self {
        Compiler {
            context,
            module: context.create_module(&config.module_name),
            builder: context.create_builder(),
            config,
            analysis,
            diagnostics: Diagnostics::new(),
            slots: vec![],
            functions: HashMap::new(),
            literal_cells: HashMap::new(),
            current_function: None,
            current_return: None,
            position: Position::null(),
            boolean_strings: None,
        }
    }

    /// Lowers a whole unit into `main`, then verifies the module.
    ///
    /// Failures are collected in `diagnostics`; a failing statement does not
    /// stop the statements after it.
    pub fn compile_program(&mut self, program: &Program) {
        if let Err(error) = self.configure_target() {
            self.diagnostics.codegen(&program.span.start, error);
        }

        self.declare_externals();

        let main = self
            .module
            .add_function("main", self.context.i32_type().fn_type(&[], false), None);
        let entry = self.context.append_basic_block(main, "entry");
        self.builder.position_at_end(entry);
        self.current_function = Some(main);
        self.current_return = None;

        for statement in program.body.iter() {
            lower_statement(self, statement);
        }

        if let Err(error) = self.close_function() {
            self.diagnostics.codegen(&program.span.end, error);
        }

        if self.config.verify_module && self.diagnostics.is_empty() {
            if let Err(message) = self.module.verify() {
                self.diagnostics.codegen(
                    &program.span.start,
                    CodegenError::Verification(message.to_string()),
                );
            }
        }

        log::debug!(
            "lowered {} statements into '{}': {} slots, {} functions",
            program.body.len(),
            self.config.module_name,
            self.slots.len(),
            self.functions.len()
        );
    }

    /// Sets the module triple and data layout for the configured target.
    fn configure_target(&self) -> Result<(), CodegenError> {
        let triple = match &self.config.target {
            TargetSelection::None => return Ok(()),
            TargetSelection::Host => {
                Target::initialize_native(&InitializationConfig::default())
                    .map_err(CodegenError::Target)?;
                TargetMachine::get_default_triple()
            }
            TargetSelection::Triple(triple) => {
                Target::initialize_all(&InitializationConfig::default());
                TargetTriple::create(triple)
            }
        };

        let target =
            Target::from_triple(&triple).map_err(|error| CodegenError::Target(error.to_string()))?;
        let target_machine = target
            .create_target_machine(
                &triple,
                "generic",
                "",
                OptimizationLevel::None,
                RelocMode::PIC,
                CodeModel::Default,
            )
            .ok_or_else(|| {
                CodegenError::Target(format!("no target machine for {:?}", self.config.target))
            })?;

        self.module.set_triple(&triple);
        self.module
            .set_data_layout(&target_machine.get_target_data().get_data_layout());
        Ok(())
    }

    /// Declares `printf` and `strcmp`.
    fn declare_externals(&self) {
        let i8_ptr_type = self.context.i8_type().ptr_type(AddressSpace::default());

        let printf_type = self.context.i32_type().fn_type(&[i8_ptr_type.into()], true);
        self.module
            .add_function("printf", printf_type, Some(Linkage::External));

        let strcmp_type = self
            .context
            .i32_type()
            .fn_type(&[i8_ptr_type.into(), i8_ptr_type.into()], false);
        self.module
            .add_function("strcmp", strcmp_type, Some(Linkage::External));
    }

    pub fn external(&self, name: &str) -> Result<FunctionValue<'a>, CodegenError> {
        self.module
            .get_function(name)
            .ok_or_else(|| CodegenError::NotAFunction {
                name: name.to_string(),
            })
    }

    /// Converts a type of the model to an LLVM basic type.
    ///
    /// `Bot` and unresolved inference variables have no IR type.
    pub fn llvm_type(&self, ty: &Type) -> Option<BasicTypeEnum<'a>> {
        match self.analysis.types.prune(ty) {
            Type::Int => Some(self.context.i32_type().into()),
            Type::Bool => Some(self.context.i8_type().into()),
            Type::Str => Some(
                self.context
                    .i8_type()
                    .ptr_type(AddressSpace::default())
                    .into(),
            ),
            Type::Bot | Type::Infer(_) => None,
            Type::Array(array) => Some(
                self.llvm_type(&array.element)?
                    .array_type(array.length)
                    .into(),
            ),
            Type::Invoke(invoke) => Some(
                self.llvm_fn_type(&invoke)?
                    .ptr_type(AddressSpace::default())
                    .into(),
            ),
            Type::Sum(sum) => Some(self.llvm_sum_type(&sum)?.into()),
        }
    }

    /// Function type of a signature; a `Bot` return becomes `void`.
    pub fn llvm_fn_type(&self, invoke: &InvokeType) -> Option<FunctionType<'a>> {
        let mut params: Vec<BasicMetadataTypeEnum<'a>> = vec![];
        for param in invoke.params.iter() {
            params.push(self.llvm_type(param)?.into());
        }

        if self.analysis.types.prune(&invoke.ret).is_bot() {
            Some(self.context.void_type().fn_type(&params, invoke.variadic))
        } else {
            Some(
                self.llvm_type(&invoke.ret)?
                    .fn_type(&params, invoke.variadic),
            )
        }
    }

    /// `{ i32 tag, [N x i8] payload }` where N fits the largest case.
    pub fn llvm_sum_type(&self, sum: &SumType) -> Option<StructType<'a>> {
        let mut payload = 0;
        for case in sum.cases.iter() {
            self.llvm_type(case)?;
            payload = payload.max(self.payload_size(case));
        }

        Some(self.context.struct_type(
            &[
                self.context.i32_type().into(),
                self.context.i8_type().array_type(payload).into(),
            ],
            false,
        ))
    }

    fn payload_size(&self, ty: &Type) -> u32 {
        match self.analysis.types.prune(ty) {
            Type::Int => 4,
            Type::Bool => 1,
            Type::Str | Type::Invoke(_) => POINTER_SIZE,
            Type::Array(array) => array.length * self.payload_size(&array.element),
            Type::Sum(sum) => {
                let largest = sum
                    .cases
                    .iter()
                    .map(|case| self.payload_size(case))
                    .max()
                    .unwrap_or(0);
                4 + largest.div_ceil(4) * 4
            }
            Type::Bot | Type::Infer(_) => 0,
        }
    }

    pub fn describe(&self, ty: &Type) -> String {
        self.analysis.types.describe(ty)
    }

    /// The symbol the checker bound to `node`.
    pub fn symbol_of(&self, node: NodeId) -> Result<SymbolId, CodegenError> {
        self.analysis
            .bindings
            .lookup(node)
            .ok_or(CodegenError::UnboundNode { node: node.0 })
    }

    /// Type the target of the write `node` holds afterwards.
    pub fn stored_type(&self, node: NodeId, variable: &str) -> Result<Type, CodegenError> {
        let ty = self
            .analysis
            .stored_types
            .get(&node)
            .map(|ty| self.analysis.types.prune(ty))
            .ok_or_else(|| CodegenError::UnresolvedType {
                variable: variable.to_string(),
            })?;

        if matches!(ty, Type::Infer(_)) {
            return Err(CodegenError::UnresolvedType {
                variable: variable.to_string(),
            });
        }
        Ok(ty)
    }

    pub fn slot_of(&self, symbol: SymbolId) -> Option<&Slot<'a>> {
        let StorageSlot(index) = self.analysis.scopes.symbol(symbol).storage?;
        self.slots.get(index as usize)
    }

    pub fn function(&self) -> Result<FunctionValue<'a>, CodegenError> {
        self.current_function.ok_or(CodegenError::NoInsertionPoint)
    }

    pub fn append_block(&self, name: &str) -> Result<BasicBlock<'a>, CodegenError> {
        let function = self.function()?;
        log::debug!(
            "block '{}' appended to '{}'",
            name,
            function.get_name().to_string_lossy()
        );
        Ok(self.context.append_basic_block(function, name))
    }

    /// Whether the builder's block still needs a terminator.
    pub fn is_open(&self) -> bool {
        self.builder
            .get_insert_block()
            .map(|block| block.get_terminator().is_none())
            .unwrap_or(false)
    }

    /// Branches to `target` unless the current block is already terminated.
    pub fn branch_to(&self, target: BasicBlock<'a>) -> Result<(), CodegenError> {
        if self.is_open() {
            self.builder.build_unconditional_branch(target)?;
        }
        Ok(())
    }

    /// Terminates the current block of the function being lowered.
    pub fn close_function(&self) -> Result<(), CodegenError> {
        if self.builder.get_insert_block().is_none() {
            return Err(CodegenError::NoInsertionPoint);
        }
        if !self.is_open() {
            return Ok(());
        }

        match &self.current_return {
            None => {
                self.builder
                    .build_return(Some(&self.context.i32_type().const_zero()))?;
            }
            Some(ret) if self.analysis.types.prune(ret).is_bot() => {
                self.builder.build_return(None)?;
            }
            Some(_) => {
                self.builder.build_unreachable()?;
            }
        }
        Ok(())
    }

    /// Allocates a cell in the entry block of the current function, so it
    /// dominates every use.
    pub fn entry_alloca(
        &self,
        ty: BasicTypeEnum<'a>,
        name: &str,
    ) -> Result<PointerValue<'a>, CodegenError> {
        let entry = self
            .function()?
            .get_first_basic_block()
            .ok_or(CodegenError::NoInsertionPoint)?;

        let builder = self.context.create_builder();
        match entry.get_first_instruction() {
            Some(instruction) => builder.position_before(&instruction),
            None => builder.position_at_end(entry),
        }

        Ok(builder.build_alloca(ty, name)?)
    }

    /// Routes a constant through the function's literal cell so the builder
    /// cannot fold the operation using it.
    pub fn unfold(&mut self, value: IntValue<'a>) -> Result<IntValue<'a>, CodegenError> {
        if self.config.fold_constants || !value.is_const() {
            return Ok(value);
        }

        let width = value.get_type().get_bit_width();
        let cell = match self.literal_cells.get(&width) {
            Some(cell) => *cell,
            None => {
                let cell = self.entry_alloca(value.get_type().into(), "literal")?;
                self.literal_cells.insert(width, cell);
                cell
            }
        };

        self.builder.build_store(cell, value)?;
        Ok(self.builder.build_load(cell, "literal")?.into_int_value())
    }

    /// Applies `unfold` to the first operand when both are constants.
    pub fn unfold_pair(
        &mut self,
        left: IntValue<'a>,
        right: IntValue<'a>,
    ) -> Result<(IntValue<'a>, IntValue<'a>), CodegenError> {
        if left.is_const() && right.is_const() {
            Ok((self.unfold(left)?, right))
        } else {
            Ok((left, right))
        }
    }

    /// Narrows a canonical `i8` boolean to the `i1` a branch needs.
    pub fn to_condition(&self, value: IntValue<'a>) -> Result<IntValue<'a>, CodegenError> {
        if value.get_type().get_bit_width() == 1 {
            return Ok(value);
        }

        Ok(self.builder.build_int_compare(
            IntPredicate::NE,
            value,
            value.get_type().const_zero(),
            "cond",
        )?)
    }

    /// Widens an `i1` comparison result to the canonical `i8` boolean.
    pub fn widen(&self, value: IntValue<'a>) -> Result<BasicValueEnum<'a>, CodegenError> {
        Ok(self
            .builder
            .build_int_z_extend(value, self.context.i8_type(), "bool")?
            .into())
    }

    /// The `"true"` and `"false"` strings `print` renders booleans with.
    pub fn boolean_strings(
        &mut self,
    ) -> Result<(PointerValue<'a>, PointerValue<'a>), CodegenError> {
        if let Some(strings) = self.boolean_strings {
            return Ok(strings);
        }

        let strings = (
            self.builder
                .build_global_string_ptr("true", "true")?
                .as_pointer_value(),
            self.builder
                .build_global_string_ptr("false", "false")?
                .as_pointer_value(),
        );
        self.boolean_strings = Some(strings);
        Ok(strings)
    }

    /// Stores `value` as the new content of `symbol`.
    ///
    /// The slot is allocated at the first write. A write whose stored type
    /// needs a different IR type than the current slot gets a fresh slot and
    /// the symbol is re-pointed to it.
    pub fn write_symbol(
        &mut self,
        symbol: SymbolId,
        stored: &Type,
        value: BasicValueEnum<'a>,
    ) -> Result<(), CodegenError> {
        let name = self.analysis.scopes.symbol(symbol).identifier.clone();
        let ir_type = self.llvm_type(stored).ok_or_else(|| CodegenError::NoIrType {
            ty: self.describe(stored),
        })?;

        let existing = self
            .analysis
            .scopes
            .symbol(symbol)
            .storage
            .filter(|slot| self.slots[slot.0 as usize].ir_type == ir_type);

        let slot = match existing {
            Some(slot) => slot,
            None => {
                let pointer = self.entry_alloca(ir_type, &name)?;
                let slot = StorageSlot(self.slots.len() as u32);
                self.slots.push(Slot {
                    pointer,
                    ir_type,
                    ty: stored.clone(),
                });
                self.analysis.scopes.symbol_mut(symbol).storage = Some(slot);

                log::debug!(
                    "storage {} allocated for '{}' as {}",
                    slot.0,
                    name,
                    ir_type.print_to_string().to_string()
                );
                slot
            }
        };

        let pointer = self.slots[slot.0 as usize].pointer;
        self.slots[slot.0 as usize].ty = stored.clone();

        if value.get_type() == ir_type {
            self.builder.build_store(pointer, value)?;
            return Ok(());
        }

        match self.analysis.types.prune(stored) {
            Type::Sum(sum) => {
                let tag = self.case_index(&sum, stored, value)?;
                self.store_member(pointer, tag, value)
            }
            _ => Err(CodegenError::StoreMismatch {
                variable: name,
                expected: ir_type.print_to_string().to_string(),
                received: value.get_type().print_to_string().to_string(),
            }),
        }
    }

    /// Tag of the case a member value belongs to, matched on its IR type.
    fn case_index(
        &self,
        sum: &SumType,
        ty: &Type,
        value: BasicValueEnum<'a>,
    ) -> Result<u32, CodegenError> {
        sum.cases
            .iter()
            .position(|case| self.llvm_type(case) == Some(value.get_type()))
            .map(|index| index as u32)
            .ok_or_else(|| CodegenError::NotAMember {
                ty: self.describe(ty),
                received: value.get_type().print_to_string().to_string(),
            })
    }

    /// Writes the tag and payload of a member value into a sum cell.
    fn store_member(
        &self,
        pointer: PointerValue<'a>,
        tag: u32,
        value: BasicValueEnum<'a>,
    ) -> Result<(), CodegenError> {
        let tag_pointer = self.builder.build_struct_gep(pointer, 0, "tag")?;
        self.builder.build_store(
            tag_pointer,
            self.context.i32_type().const_int(tag as u64, false),
        )?;

        let payload = self.builder.build_struct_gep(pointer, 1, "payload")?;
        let member = self.builder.build_pointer_cast(
            payload,
            value.get_type().ptr_type(AddressSpace::default()),
            "member",
        )?;
        let store = self.builder.build_store(member, value)?;
        store
            .set_alignment(1)
            .map_err(|error| CodegenError::Builder(error.to_string()))?;

        Ok(())
    }

    /// Converts a value to the representation `target` expects. Only a
    /// member flowing into a sum changes: it is wrapped with its tag.
    pub fn coerce(
        &self,
        value: BasicValueEnum<'a>,
        target: &Type,
    ) -> Result<BasicValueEnum<'a>, CodegenError> {
        let Type::Sum(sum) = self.analysis.types.prune(target) else {
            return Ok(value);
        };

        let sum_type = self
            .llvm_sum_type(&sum)
            .ok_or_else(|| CodegenError::NoIrType {
                ty: self.describe(target),
            })?;
        if value.get_type() == sum_type.as_basic_type_enum() {
            return Ok(value);
        }

        let tag = self.case_index(&sum, target, value)?;
        let cell = self.entry_alloca(sum_type.into(), "sum")?;
        self.store_member(cell, tag, value)?;
        Ok(self.builder.build_load(cell, "sum")?)
    }

    /// Stores `value` into a fresh entry cell and returns the cell.
    pub fn spill(
        &self,
        value: BasicValueEnum<'a>,
        name: &str,
    ) -> Result<PointerValue<'a>, CodegenError> {
        let cell = self.entry_alloca(value.get_type(), name)?;
        self.builder.build_store(cell, value)?;
        Ok(cell)
    }
}

/// The main compile function: lowers a checked unit into a new module.
///
/// `analysis` must carry no diagnostics. Symbols receive their storage slots
/// as a side effect.
///
/// # Returns
///
/// The verified module, or every Codegen diagnostic raised while lowering.
pub fn compile<'a>(
    context: &'a Context,
    program: &Program,
    analysis: &mut Analysis,
    config: &CompilerConfig,
) -> Result<Module<'a>, Diagnostics> {
    let mut compiler = Compiler::new(context, analysis, config);
    compiler.compile_program(program);

    let Compiler {
        module,
        diagnostics,
        ..
    } = compiler;

    if diagnostics.is_empty() {
        Ok(module)
    } else {
        Err(diagnostics)
    }
}
