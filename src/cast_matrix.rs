//! C5 — the type cast matrix: a bidirectional table of permissible
//! conversions between type declarations, seeded from user-declared cast
//! functions and the hard-coded primitive rules (§4.4), plus the
//! operator-overload index keyed by operator symbol.
//!
//! Ported rule-for-rule from `scriptTypeCasting.cpp`'s `findBestCast` and
//! `findOperator`.

use crate::stubs::ids::{FunctionArgId, FunctionId, TypeDeclId, TypeRefId};
use crate::stubs::kinds::{EngineType, TypeDecl, TypeRef};
use crate::stubs::{ArgFlags, ClassId, FunctionArg};
use crate::arena::IdArena;
use rustc_hash::FxHashMap;

/// What kind of conversion `findBestCast` chose, and how (opcode wrapper
/// vs. a call to a user cast function vs. no conversion needed at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastKind {
    /// Identical types; the node is left untouched (rule 1).
    Passthrough,
    /// Same underlying pointee, pointer kind stays put — no ref
    /// adjustment opcode needed either (rule 7/9).
    PassthroughNoRef,
    CastStrongPtrToBool,
    CastWeakPtrToBool,
    CastVariantToType,
    CastTypeToVariant,
    EnumToInt64,
    EnumToInt32,
    Int64ToEnum,
    Int32ToEnum,
    EnumToName,
    NameToEnum,
    EnumToString,
    CastStrongToWeak,
    CastWeakToStrong,
    CastDownStrong,
    CastDownWeak,
    CastClassMetaDownCast,
    CastClassToBool,
    CastClassToName,
    CastClassToString,
    /// A user-declared `cast` function; `FunctionId` is looked up
    /// separately since this kind alone isn't enough to recover which
    /// function backs it (several casts of the same shape can't both be
    /// `CastFunc` without a payload, so callers use `TypeCast::function`).
    CastFunc,
}

/// Result of `findBestCast`: the cast to perform plus its cost and
/// whether it requires an explicit cast expression in source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeCast {
    pub kind: CastKind,
    pub cost: i32,
    pub explicit: bool,
    /// Populated only when `kind == CastFunc`.
    pub function: Option<FunctionId>,
}

impl TypeCast {
    pub fn no_cast() -> Self {
        Self { kind: CastKind::Passthrough, cost: -1, explicit: false, function: None }
    }

    pub fn is_possible(&self) -> bool {
        self.cost >= 0
    }

    fn simple(kind: CastKind, cost: i32, explicit: bool) -> Self {
        Self { kind, cost, explicit, function: None }
    }
}

/// Seeded from the full function list (including imports) after class
/// and type resolution (§4.4 Build phase).
#[derive(Debug, Default)]
pub struct CastMatrix {
    /// `(source, dest)` keyed by resolved-stub identity, not `TypeDeclId`
    /// identity, so two structurally-equal-but-distinct `TypeDecl`
    /// allocations still share one cast-function entry.
    user_casts: FxHashMap<(CastKey, CastKey), (FunctionId, i32, bool)>,
    /// Keyed by the interned operator symbol (`opAdd`, …) rather than a
    /// resolved `&str`, since this module has no string-table access.
    operators: FxHashMap<crate::string_interning::StringId, Vec<FunctionId>>,
}

/// A hashable, structural stand-in for a resolved `TypeDecl`, used only
/// as a `HashMap` key for the user-cast table (`TypeDeclId` identity
/// isn't stable across distinct-but-equal allocations, e.g. after import
/// merging clones a decl).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CastKey {
    Engine(EngineType),
    Class(ClassId),
    Enum(crate::stubs::EnumId),
    Ptr(ClassId),
    WeakPtr(ClassId),
    ClassMeta(ClassId),
    Other,
}

fn cast_key(
    decl: TypeDeclId,
    decls: &IdArena<TypeDeclId, TypeDecl>,
    type_refs: &IdArena<TypeRefId, TypeRef>,
) -> CastKey {
    match decls.get(decl) {
        TypeDecl::Engine(e) => CastKey::Engine(*e),
        TypeDecl::Simple(r) => match type_refs.get(*r).resolved {
            Some(crate::stubs::ResolvedSymbol::Class(c)) => CastKey::Class(c),
            Some(crate::stubs::ResolvedSymbol::Enum(e)) => CastKey::Enum(e),
            _ => CastKey::Other,
        },
        TypeDecl::PtrType(r) => type_refs
            .get(*r)
            .resolved
            .and_then(|s| s.as_class())
            .map(CastKey::Ptr)
            .unwrap_or(CastKey::Other),
        TypeDecl::WeakPtrType(r) => type_refs
            .get(*r)
            .resolved
            .and_then(|s| s.as_class())
            .map(CastKey::WeakPtr)
            .unwrap_or(CastKey::Other),
        TypeDecl::ClassType(r) => type_refs
            .get(*r)
            .resolved
            .and_then(|s| s.as_class())
            .map(CastKey::ClassMeta)
            .unwrap_or(CastKey::Other),
        _ => CastKey::Other,
    }
}

/// Everything `findBestCast`/`findOperator` need read access to: the
/// type-decl and type-ref arenas plus the class arena for inheritance
/// walks.
pub struct CastContext<'a> {
    pub decls: &'a IdArena<TypeDeclId, TypeDecl>,
    pub type_refs: &'a IdArena<TypeRefId, TypeRef>,
    pub classes: &'a IdArena<ClassId, crate::stubs::Class>,
    pub functions: &'a IdArena<FunctionId, crate::stubs::Function>,
    pub function_args: &'a IdArena<FunctionArgId, FunctionArg>,
}

impl<'a> CastContext<'a> {
    fn resolved_class(&self, decl: TypeDeclId) -> Option<ClassId> {
        self.decls.get(decl).type_ref().and_then(|r| self.type_refs.get(r).resolved).and_then(|s| s.as_class())
    }

    fn derives_from(&self, derived: ClassId, base: ClassId) -> bool {
        let mut current = Some(derived);
        while let Some(id) = current {
            if id == base {
                return true;
            }
            current = self.classes.get(id).base_resolved;
        }
        false
    }
}

impl CastMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build phase (§4.4): every `cast`-flagged function contributes an
    /// entry keyed on `(args[0].type, return_type)`; every
    /// `operator`-flagged function is appended to the operator index by
    /// symbol. Driven by the stub library once class/type resolution has
    /// finished, over the full function list including imports.
    pub fn build<'a>(&mut self, functions: impl IntoIterator<Item = (FunctionId, &'a crate::stubs::Function)>, ctx: &CastContext) {
        for (id, func) in functions {
            if func.flags.contains(crate::stubs::FunctionFlags::CAST) {
                if let (Some(&arg0), Some(ret)) = (func.args.first(), func.return_type) {
                    let source = ctx.function_args.get(arg0).type_decl;
                    let cost = func.cast_cost.unwrap_or(0) as i32;
                    self.register_cast(source, ret, id, cost, func.cast_explicit, ctx);
                }
            }
            if func.flags.contains(crate::stubs::FunctionFlags::OPERATOR) {
                if let Some(sym) = func.operator_symbol {
                    self.register_operator(sym, id);
                }
            }
        }
    }

    /// Registers one `cast`-flagged function's entry. Called by the stub
    /// library once it can resolve `arg0`'s and the return type's decls
    /// (avoids `CastMatrix::build` needing the function-arg arena too).
    pub fn register_cast(
        &mut self,
        source: TypeDeclId,
        dest: TypeDeclId,
        function: FunctionId,
        cost: i32,
        explicit: bool,
        ctx: &CastContext,
    ) {
        let key = (cast_key(source, ctx.decls, ctx.type_refs), cast_key(dest, ctx.decls, ctx.type_refs));
        self.user_casts.insert(key, (function, cost, explicit));
    }

    pub fn register_operator(&mut self, symbol: crate::string_interning::StringId, function: FunctionId) {
        self.operators.entry(symbol).or_default().push(function);
    }

    pub fn operators_for(&self, symbol: crate::string_interning::StringId) -> &[FunctionId] {
        self.operators.get(&symbol).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// `findBestCast(source, dest)`: the 12-rule deterministic decision
    /// table (§4.4). First matching rule wins.
    pub fn find_best_cast(&self, source: TypeDeclId, dest: TypeDeclId, ctx: &CastContext) -> TypeCast {
        // Rule 1: structural equality.
        if TypeDecl::structurally_equal(source, dest, ctx.decls, ctx.type_refs) {
            return TypeCast::simple(CastKind::Passthrough, 0, false);
        }

        let src = ctx.decls.get(source);
        let dst = ctx.decls.get(dest);

        // Rule 2/3: pointer -> bool.
        if dst.is_bool() {
            if src.is_shared_ptr() {
                return TypeCast::simple(CastKind::CastStrongPtrToBool, 10, false);
            }
            if src.is_weak_ptr() {
                return TypeCast::simple(CastKind::CastWeakPtrToBool, 10, false);
            }
        }

        // Rule 4: source is Variant.
        if src.is_variant() {
            return TypeCast::simple(CastKind::CastVariantToType, 20, true);
        }

        // Rule 5: dest is Variant.
        if dst.is_variant() {
            return TypeCast::simple(CastKind::CastTypeToVariant, 5, false);
        }

        // Rule 6: enum <-> int64/int32/strid/string.
        if src.is_enum(ctx.type_refs) {
            match dst {
                TypeDecl::Engine(EngineType::Int64) => {
                    return TypeCast::simple(CastKind::EnumToInt64, 3, true)
                }
                TypeDecl::Engine(EngineType::Int) => {
                    return TypeCast::simple(CastKind::EnumToInt32, 3, true)
                }
                TypeDecl::Engine(EngineType::Strid) => {
                    return TypeCast::simple(CastKind::EnumToName, 5, false)
                }
                TypeDecl::Engine(EngineType::String) => {
                    return TypeCast::simple(CastKind::EnumToString, 5, false)
                }
                _ => {}
            }
        }
        if dst.is_enum(ctx.type_refs) {
            match src {
                TypeDecl::Engine(EngineType::Int64) => {
                    return TypeCast::simple(CastKind::Int64ToEnum, 3, true)
                }
                TypeDecl::Engine(EngineType::Int) => {
                    return TypeCast::simple(CastKind::Int32ToEnum, 3, true)
                }
                TypeDecl::Engine(EngineType::Strid | EngineType::String) => {
                    return TypeCast::simple(CastKind::NameToEnum, 5, true)
                }
                _ => {}
            }
        }

        // Rules 7-8: both pointers.
        if src.is_pointer() && dst.is_pointer() {
            if let (Some(sc), Some(dc)) = (self.resolved_class(source, ctx), self.resolved_class(dest, ctx)) {
                if ctx.derives_from(sc, dc) {
                    // upcast: source derives from (or equals) dest.
                    return match (src.is_shared_ptr(), dst.is_shared_ptr()) {
                        (true, true) | (false, false) => {
                            TypeCast::simple(CastKind::PassthroughNoRef, 1, false)
                        }
                        (true, false) => TypeCast::simple(CastKind::CastStrongToWeak, 1, false),
                        (false, true) => TypeCast::simple(CastKind::CastWeakToStrong, 1, false),
                    };
                }
                if ctx.derives_from(dc, sc) {
                    // downcast: dest derives from source.
                    return if dst.is_shared_ptr() {
                        TypeCast::simple(CastKind::CastDownStrong, 2, true)
                    } else {
                        TypeCast::simple(CastKind::CastDownWeak, 2, true)
                    };
                }
            }
        }

        // Rules 9-10: both class-meta.
        if src.is_class_meta() && dst.is_class_meta() {
            if let (Some(sc), Some(dc)) = (self.resolved_class(source, ctx), self.resolved_class(dest, ctx)) {
                if ctx.derives_from(sc, dc) {
                    return TypeCast::simple(CastKind::PassthroughNoRef, 0, false);
                }
                if ctx.derives_from(dc, sc) {
                    return TypeCast::simple(CastKind::CastClassMetaDownCast, 3, true);
                }
            }
        }

        // Rule 11: class-meta -> bool/strid/string.
        if src.is_class_meta() {
            match dst {
                TypeDecl::Engine(EngineType::Bool) => {
                    return TypeCast::simple(CastKind::CastClassToBool, 7, false)
                }
                TypeDecl::Engine(EngineType::Strid) => {
                    return TypeCast::simple(CastKind::CastClassToName, 10, false)
                }
                TypeDecl::Engine(EngineType::String) => {
                    return TypeCast::simple(CastKind::CastClassToString, 10, false)
                }
                _ => {}
            }
        }

        // Rule 12: user-declared cast function.
        let key = (cast_key(source, ctx.decls, ctx.type_refs), cast_key(dest, ctx.decls, ctx.type_refs));
        if let Some(&(function, cost, explicit)) = self.user_casts.get(&key) {
            return TypeCast { kind: CastKind::CastFunc, cost, explicit, function: Some(function) };
        }

        TypeCast::no_cast()
    }

    fn resolved_class(&self, decl: TypeDeclId, ctx: &CastContext) -> Option<ClassId> {
        ctx.resolved_class(decl)
    }

    /// `findOperator(sym, left, leftAssignable, right, allowCasts)` (§4.4).
    pub fn find_operator(
        &self,
        symbol: crate::string_interning::StringId,
        left: TypeDeclId,
        left_assignable: bool,
        right: Option<TypeDeclId>,
        allow_casts: bool,
        ctx: &CastContext,
    ) -> Option<(FunctionId, i32)> {
        let candidates = self.operators_for(symbol);
        let arity_needed = if right.is_some() { 2 } else { 1 };

        let mut best: Option<(FunctionId, i32)> = None;
        for &candidate_id in candidates {
            let candidate = ctx.functions.get(candidate_id);
            if candidate.args.len() != arity_needed {
                continue;
            }

            let Some(&arg0_id) = candidate.args.first() else { continue };
            let arg0 = ctx.function_args.get(arg0_id);
            if arg0.flags.contains(ArgFlags::OUT) && !left_assignable {
                continue;
            }

            let cast0 = self.find_best_cast(left, arg0.type_decl, ctx);
            if !cast0.is_possible() || (cast0.explicit && !allow_casts) {
                continue;
            }

            let mut total_cost = cast0.cost;

            if let Some(right_ty) = right {
                let Some(&arg1_id) = candidate.args.get(1) else { continue };
                let arg1 = ctx.function_args.get(arg1_id);
                let cast1 = self.find_best_cast(right_ty, arg1.type_decl, ctx);
                if !cast1.is_possible() || (cast1.explicit && !allow_casts) {
                    continue;
                }
                total_cost += cast1.cost;
            }

            // First-scanned wins ties — registration order is source
            // order (§4.4's "no additional tie-break is specified; an
            // implementation must pick deterministically").
            if best.map(|(_, cost)| total_cost < cost).unwrap_or(true) {
                best = Some((candidate_id, total_cost));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::IdArena;
    use crate::stubs::ids::StubOwner;
    use crate::stubs::{Class, ClassFlags};

    type Ctx = (
        IdArena<TypeDeclId, TypeDecl>,
        IdArena<TypeRefId, TypeRef>,
        IdArena<ClassId, Class>,
        IdArena<FunctionId, crate::stubs::Function>,
        IdArena<FunctionArgId, FunctionArg>,
    );

    fn base_ctx() -> Ctx {
        (IdArena::new(), IdArena::new(), IdArena::new(), IdArena::new(), IdArena::new())
    }

    fn dummy_file(classes: &mut IdArena<ClassId, Class>) -> crate::stubs::ids::FileId {
        let _ = classes;
        IdArena::<crate::stubs::ids::FileId, ()>::new().alloc(())
    }

    #[test]
    fn identical_engine_types_are_passthrough() {
        let (mut decls, refs, classes, functions, function_args) = base_ctx();
        let int_a = decls.alloc(TypeDecl::Engine(EngineType::Int));
        let int_b = decls.alloc(TypeDecl::Engine(EngineType::Int));
        let matrix = CastMatrix::new();
        let ctx = CastContext {
            decls: &decls,
            type_refs: &refs,
            classes: &classes,
            functions: &functions,
            function_args: &function_args,
        };
        let cast = matrix.find_best_cast(int_a, int_b, &ctx);
        assert_eq!(cast.kind, CastKind::Passthrough);
        assert_eq!(cast.cost, 0);
        assert!(!cast.explicit);
    }

    #[test]
    fn variant_cast_is_explicit_and_costly() {
        let (mut decls, refs, classes, functions, function_args) = base_ctx();
        let variant = decls.alloc(TypeDecl::Engine(EngineType::Variant));
        let int_ty = decls.alloc(TypeDecl::Engine(EngineType::Int));
        let matrix = CastMatrix::new();
        let ctx = CastContext {
            decls: &decls,
            type_refs: &refs,
            classes: &classes,
            functions: &functions,
            function_args: &function_args,
        };
        let cast = matrix.find_best_cast(variant, int_ty, &ctx);
        assert_eq!(cast.kind, CastKind::CastVariantToType);
        assert_eq!(cast.cost, 20);
        assert!(cast.explicit);

        let cast_back = matrix.find_best_cast(int_ty, variant, &ctx);
        assert_eq!(cast_back.kind, CastKind::CastTypeToVariant);
        assert_eq!(cast_back.cost, 5);
        assert!(!cast_back.explicit);
    }

    #[test]
    fn upcast_is_cheap_downcast_is_explicit() {
        let (mut decls, mut refs, mut classes, functions, function_args) = base_ctx();
        let file = dummy_file(&mut classes);
        let module = IdArena::<crate::stubs::ids::ModuleId, ()>::new().alloc(());
        let loc = crate::stubs::SourceLocation::new(file, 1, 1);

        let base = classes.alloc(Class {
            owner: StubOwner::Module(module),
            location: loc,
            name: crate::string_interning::StringId::from_u32(0),
            flags: ClassFlags::empty(),
            base_name: None,
            base_resolved: None,
            parent_name: None,
            parent_resolved: None,
            engine_alias: None,
            members: Vec::new(),
            member_names: Vec::new(),
            derived_classes: Vec::new(),
            child_classes: Vec::new(),
        });
        let mut derived_class = classes.get(base).clone();
        derived_class.base_resolved = Some(base);
        let derived = classes.alloc(derived_class);

        let base_ref = refs.alloc(TypeRef {
            owner: None,
            location: loc,
            name: crate::interned_path::InternedPath::new(),
            resolved: Some(crate::stubs::ResolvedSymbol::Class(base)),
        });
        let derived_ref = refs.alloc(TypeRef {
            owner: None,
            location: loc,
            name: crate::interned_path::InternedPath::new(),
            resolved: Some(crate::stubs::ResolvedSymbol::Class(derived)),
        });
        let base_ptr = decls.alloc(TypeDecl::PtrType(base_ref));
        let derived_ptr = decls.alloc(TypeDecl::PtrType(derived_ref));

        let matrix = CastMatrix::new();
        let ctx = CastContext {
            decls: &decls,
            type_refs: &refs,
            classes: &classes,
            functions: &functions,
            function_args: &function_args,
        };

        let up = matrix.find_best_cast(derived_ptr, base_ptr, &ctx);
        assert_eq!(up.kind, CastKind::PassthroughNoRef);
        assert!(!up.explicit);

        let down = matrix.find_best_cast(base_ptr, derived_ptr, &ctx);
        assert_eq!(down.kind, CastKind::CastDownStrong);
        assert!(down.explicit);
    }
}
