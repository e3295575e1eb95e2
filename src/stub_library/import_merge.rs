//! Import merging (§4.3.9): deep-clones every stub owned directly by an
//! already-compiled module into this library, under a single fresh
//! `ModuleId`, with every cloned stub's `IMPORT` flag forced on.
//!
//! The imported library is assumed self-contained: its own imports were
//! already merged before it reached this pass, so its `ModuleImport`
//! stubs carry nothing we still need, and its `Module`/file-tree shape
//! collapses into one flat module here rather than being reproduced.

use super::StubLibrary;
use crate::arena::ArenaId;
use crate::opcode_emitter::Opcode;
use crate::stubs::ids::{
    ClassId, ConstantId, ConstantValueId, EnumId, EnumOptionId, FileId, FunctionArgId, FunctionId,
    ModuleId, PropertyId, ResolvedSymbol, StubOwner, TypeDeclId, TypeNameId, TypeRefId,
};
use crate::stubs::kinds::{
    Class, ClassMember, Constant, ConstantValue, Enum, EnumOption, File, Function, FunctionArg,
    Property, TopLevelMember, TypeDecl, TypeName, TypeRef,
};
use crate::stubs::location::SourceLocation;
use crate::stubs::{ClassFlags, FunctionFlags, MemberFlags};
use crate::string_interning::StringId;
use rustc_hash::FxHashMap;

/// Constant per-kind id offsets: imported id `i` of kind `K` becomes
/// `base_K + i` in `self`, since both `self`'s and the imported
/// library's arenas are append-only and cloning walks every source
/// arena in original order.
struct Offsets {
    module: ModuleId,
    file: u32,
    class: u32,
    r#enum: u32,
    enum_option: u32,
    property: u32,
    function: u32,
    function_arg: u32,
    constant: u32,
    constant_value: u32,
    type_name: u32,
    type_ref: u32,
    type_decl: u32,
}

fn map_file(o: &Offsets, id: FileId) -> FileId {
    FileId::from_index(o.file + id.index())
}
fn map_class(o: &Offsets, id: ClassId) -> ClassId {
    ClassId::from_index(o.class + id.index())
}
fn map_enum(o: &Offsets, id: EnumId) -> EnumId {
    EnumId::from_index(o.r#enum + id.index())
}
fn map_enum_option(o: &Offsets, id: EnumOptionId) -> EnumOptionId {
    EnumOptionId::from_index(o.enum_option + id.index())
}
fn map_property(o: &Offsets, id: PropertyId) -> PropertyId {
    PropertyId::from_index(o.property + id.index())
}
fn map_function(o: &Offsets, id: FunctionId) -> FunctionId {
    FunctionId::from_index(o.function + id.index())
}
fn map_function_arg(o: &Offsets, id: FunctionArgId) -> FunctionArgId {
    FunctionArgId::from_index(o.function_arg + id.index())
}
fn map_constant(o: &Offsets, id: ConstantId) -> ConstantId {
    ConstantId::from_index(o.constant + id.index())
}
fn map_constant_value(o: &Offsets, id: ConstantValueId) -> ConstantValueId {
    ConstantValueId::from_index(o.constant_value + id.index())
}
fn map_type_name(o: &Offsets, id: TypeNameId) -> TypeNameId {
    TypeNameId::from_index(o.type_name + id.index())
}
fn map_type_ref(o: &Offsets, id: TypeRefId) -> TypeRefId {
    TypeRefId::from_index(o.type_ref + id.index())
}
fn map_type_decl(o: &Offsets, id: TypeDeclId) -> TypeDeclId {
    TypeDeclId::from_index(o.type_decl + id.index())
}

fn map_owner(o: &Offsets, owner: StubOwner) -> StubOwner {
    match owner {
        StubOwner::Module(_) => StubOwner::Module(o.module),
        StubOwner::File(f) => StubOwner::File(map_file(o, f)),
        StubOwner::Class(c) => StubOwner::Class(map_class(o, c)),
        StubOwner::Function(f) => StubOwner::Function(map_function(o, f)),
    }
}

fn map_location(o: &Offsets, loc: SourceLocation) -> SourceLocation {
    SourceLocation::new(map_file(o, loc.file), loc.line, loc.column)
}

fn map_resolved_symbol(o: &Offsets, sym: ResolvedSymbol) -> ResolvedSymbol {
    match sym {
        ResolvedSymbol::Class(c) => ResolvedSymbol::Class(map_class(o, c)),
        ResolvedSymbol::Enum(e) => ResolvedSymbol::Enum(map_enum(o, e)),
        ResolvedSymbol::TypeName(t) => ResolvedSymbol::TypeName(map_type_name(o, t)),
    }
}

fn map_top_level_member(o: &Offsets, member: TopLevelMember) -> TopLevelMember {
    match member {
        TopLevelMember::Class(c) => TopLevelMember::Class(map_class(o, c)),
        TopLevelMember::Enum(e) => TopLevelMember::Enum(map_enum(o, e)),
        TopLevelMember::Function(f) => TopLevelMember::Function(map_function(o, f)),
        TopLevelMember::Property(p) => TopLevelMember::Property(map_property(o, p)),
        TopLevelMember::Constant(c) => TopLevelMember::Constant(map_constant(o, c)),
        TopLevelMember::TypeName(t) => TopLevelMember::TypeName(map_type_name(o, t)),
    }
}

fn map_class_member(o: &Offsets, member: ClassMember) -> ClassMember {
    match member {
        ClassMember::Property(p) => ClassMember::Property(map_property(o, p)),
        ClassMember::Function(f) => ClassMember::Function(map_function(o, f)),
        ClassMember::NestedClass(c) => ClassMember::NestedClass(map_class(o, c)),
        ClassMember::Constant(c) => ClassMember::Constant(map_constant(o, c)),
        ClassMember::Enum(e) => ClassMember::Enum(map_enum(o, e)),
    }
}

impl StubLibrary {
    /// Clones every file/class/enum/.../type-decl owned (directly or
    /// transitively) by `imported`'s modules into `self`, flattened under
    /// one new `Module` named `name`. Returns that module's id.
    pub fn merge_imported_module(&mut self, name: StringId, imported: &StubLibrary) -> ModuleId {
        let new_module = self.create_module(name);
        let o = Offsets {
            module: new_module,
            file: self.files.len() as u32,
            class: self.classes.len() as u32,
            r#enum: self.enums.len() as u32,
            enum_option: self.enum_options.len() as u32,
            property: self.properties.len() as u32,
            function: self.functions.len() as u32,
            function_arg: self.function_args.len() as u32,
            constant: self.constants.len() as u32,
            constant_value: self.constant_values.len() as u32,
            type_name: self.type_names.len() as u32,
            type_ref: self.type_refs.len() as u32,
            type_decl: self.type_decls.len() as u32,
        };
        let mut strings: FxHashMap<StringId, StringId> = FxHashMap::default();

        for id in imported.files.ids() {
            self.clone_file(imported, &o, &mut strings, id);
        }
        for id in imported.classes.ids() {
            self.clone_class(imported, &o, &mut strings, id);
        }
        for id in imported.enums.ids() {
            self.clone_enum(imported, &o, &mut strings, id);
        }
        for id in imported.enum_options.ids() {
            self.clone_enum_option(imported, &o, &mut strings, id);
        }
        for id in imported.type_names.ids() {
            self.clone_type_name(imported, &o, &mut strings, id);
        }
        for id in imported.type_refs.ids() {
            self.clone_type_ref(imported, &o, &mut strings, id);
        }
        for id in imported.type_decls.ids() {
            self.clone_type_decl(imported, &o, id);
        }
        for id in imported.properties.ids() {
            self.clone_property(imported, &o, &mut strings, id);
        }
        for id in imported.function_args.ids() {
            self.clone_function_arg(imported, &o, &mut strings, id);
        }
        for id in imported.functions.ids() {
            self.clone_function(imported, &o, &mut strings, id);
        }
        for id in imported.constant_values.ids() {
            self.clone_constant_value(imported, &o, &mut strings, id);
        }
        for id in imported.constants.ids() {
            self.clone_constant(imported, &o, &mut strings, id);
        }

        let files: Vec<FileId> = imported.files.ids().map(|id| map_file(&o, id)).collect();
        self.modules.get_mut(new_module).files = files;
        self.finalize_module_members(new_module);
        new_module
    }

    fn remap_string(&mut self, imported: &StubLibrary, cache: &mut FxHashMap<StringId, StringId>, id: StringId) -> StringId {
        if let Some(&existing) = cache.get(&id) {
            return existing;
        }
        let text = id.resolve(&imported.strings).to_string();
        let new_id = self.strings.intern(&text);
        cache.insert(id, new_id);
        new_id
    }

    fn remap_path(&mut self, imported: &StubLibrary, cache: &mut FxHashMap<StringId, StringId>, path: &crate::interned_path::InternedPath) -> crate::interned_path::InternedPath {
        let components = path.as_components().iter().map(|&s| self.remap_string(imported, cache, s)).collect();
        crate::interned_path::InternedPath::from_components(components)
    }

    fn clone_file(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: FileId) {
        let f = imported.files.get(id).clone();
        let depot_path = self.remap_string(imported, strings, f.depot_path);
        let top_level = f.top_level.iter().map(|m| map_top_level_member(o, *m)).collect();
        self.files.alloc(File { owner: o.module, depot_path, abs_path: f.abs_path, top_level });
    }

    fn clone_class(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: ClassId) {
        let c = imported.classes.get(id).clone();
        let name = self.remap_string(imported, strings, c.name);
        let base_name = c.base_name.map(|s| self.remap_string(imported, strings, s));
        let parent_name = c.parent_name.map(|s| self.remap_string(imported, strings, s));
        let engine_alias = c.engine_alias.map(|s| self.remap_string(imported, strings, s));
        self.classes.alloc(Class {
            owner: map_owner(o, c.owner),
            location: map_location(o, c.location),
            name,
            flags: c.flags | ClassFlags::IMPORT,
            base_name,
            base_resolved: c.base_resolved.map(|b| map_class(o, b)),
            parent_name,
            parent_resolved: c.parent_resolved.map(|p| map_class(o, p)),
            engine_alias,
            members: c.members.iter().map(|m| map_class_member(o, *m)).collect(),
            member_names: c
                .member_names
                .iter()
                .map(|(n, m)| (self.remap_string(imported, strings, *n), map_class_member(o, *m)))
                .collect(),
            derived_classes: c.derived_classes.iter().map(|d| map_class(o, *d)).collect(),
            child_classes: c.child_classes.iter().map(|d| map_class(o, *d)).collect(),
        });
    }

    fn clone_enum(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: EnumId) {
        let e = imported.enums.get(id).clone();
        let name = self.remap_string(imported, strings, e.name);
        let engine_alias = e.engine_alias.map(|s| self.remap_string(imported, strings, s));
        self.enums.alloc(Enum {
            owner: map_owner(o, e.owner),
            location: map_location(o, e.location),
            name,
            flags: e.flags | MemberFlags::IMPORT,
            engine_alias,
            options: e.options.iter().map(|opt| map_enum_option(o, *opt)).collect(),
            option_names: e
                .option_names
                .iter()
                .map(|(n, opt)| (self.remap_string(imported, strings, *n), map_enum_option(o, *opt)))
                .collect(),
        });
    }

    fn clone_enum_option(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: EnumOptionId) {
        let opt = imported.enum_options.get(id).clone();
        let name = self.remap_string(imported, strings, opt.name);
        self.enum_options.alloc(EnumOption {
            owner: map_enum(o, opt.owner),
            location: map_location(o, opt.location),
            name,
            value: opt.value,
            has_user_assigned_value: opt.has_user_assigned_value,
        });
    }

    fn clone_type_name(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: TypeNameId) {
        let t = imported.type_names.get(id).clone();
        let name = self.remap_string(imported, strings, t.name);
        self.type_names.alloc(TypeName { owner: map_owner(o, t.owner), location: map_location(o, t.location), name, aliased: map_type_decl(o, t.aliased) });
    }

    fn clone_type_ref(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: TypeRefId) {
        let r = imported.type_refs.get(id).clone();
        let name = self.remap_path(imported, strings, &r.name);
        self.type_refs.alloc(TypeRef {
            owner: r.owner.map(|ow| map_owner(o, ow)),
            location: map_location(o, r.location),
            name,
            resolved: r.resolved.map(|s| map_resolved_symbol(o, s)),
        });
    }

    fn clone_type_decl(&mut self, imported: &StubLibrary, o: &Offsets, id: TypeDeclId) {
        let decl = imported.type_decls.get(id).clone();
        let mapped = match decl {
            TypeDecl::Engine(e) => TypeDecl::Engine(e),
            TypeDecl::Simple(r) => TypeDecl::Simple(map_type_ref(o, r)),
            TypeDecl::ClassType(r) => TypeDecl::ClassType(map_type_ref(o, r)),
            TypeDecl::PtrType(r) => TypeDecl::PtrType(map_type_ref(o, r)),
            TypeDecl::WeakPtrType(r) => TypeDecl::WeakPtrType(map_type_ref(o, r)),
            TypeDecl::StaticArrayType { inner, size } => TypeDecl::StaticArrayType { inner: map_type_decl(o, inner), size },
            TypeDecl::DynamicArrayType { inner } => TypeDecl::DynamicArrayType { inner: map_type_decl(o, inner) },
        };
        self.type_decls.alloc(mapped);
    }

    fn clone_property(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: PropertyId) {
        let p = imported.properties.get(id).clone();
        let name = self.remap_string(imported, strings, p.name);
        self.properties.alloc(Property {
            owner: map_owner(o, p.owner),
            location: map_location(o, p.location),
            name,
            flags: p.flags | MemberFlags::IMPORT,
            type_decl: map_type_decl(o, p.type_decl),
            default_value: p.default_value.map(|v| map_constant_value(o, v)),
        });
    }

    fn clone_function_arg(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: FunctionArgId) {
        let a = imported.function_args.get(id).clone();
        let name = self.remap_string(imported, strings, a.name);
        self.function_args.alloc(FunctionArg {
            owner: map_function(o, a.owner),
            location: map_location(o, a.location),
            name,
            type_decl: map_type_decl(o, a.type_decl),
            flags: a.flags,
            default_value: a.default_value.map(|v| map_constant_value(o, v)),
            index: a.index,
        });
    }

    fn clone_function(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: FunctionId) {
        let f = imported.functions.get(id).clone();
        let name = self.remap_string(imported, strings, f.name);
        let operator_symbol = f.operator_symbol.map(|s| self.remap_string(imported, strings, s));
        let opcode_name = f.opcode_name.map(|s| self.remap_string(imported, strings, s));
        let alias_name = f.alias_name.map(|s| self.remap_string(imported, strings, s));
        let opcodes = f.opcodes.iter().map(|op| self.remap_opcode(imported, o, strings, op)).collect();
        self.functions.alloc(Function {
            owner: map_owner(o, f.owner),
            location: map_location(o, f.location),
            name,
            return_type: f.return_type.map(|t| map_type_decl(o, t)),
            args: f.args.iter().map(|a| map_function_arg(o, *a)).collect(),
            flags: f.flags | FunctionFlags::IMPORT,
            operator_symbol,
            opcode_name,
            alias_name,
            cast_cost: f.cast_cost,
            cast_explicit: f.cast_explicit,
            base_function: f.base_function.map(|b| map_function(o, b)),
            // Source tokens have already been consumed by C8 in the
            // imported compilation; nothing to re-parse here.
            body_tokens: None,
            opcodes,
        });
    }

    fn clone_constant_value(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: ConstantValueId) {
        let v = imported.constant_values.get(id).clone();
        let mapped = match v {
            ConstantValue::Integer(i) => ConstantValue::Integer(i),
            ConstantValue::Unsigned(u) => ConstantValue::Unsigned(u),
            ConstantValue::Float(f) => ConstantValue::Float(f),
            ConstantValue::Bool(b) => ConstantValue::Bool(b),
            ConstantValue::Name(s) => ConstantValue::Name(self.remap_string(imported, strings, s)),
            ConstantValue::String(s) => ConstantValue::String(self.remap_string(imported, strings, s)),
            ConstantValue::Compound { type_decl, inner } => ConstantValue::Compound {
                type_decl: map_type_decl(o, type_decl),
                inner: inner.iter().map(|v| map_constant_value(o, *v)).collect(),
            },
        };
        self.constant_values.alloc(mapped);
    }

    fn clone_constant(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, id: ConstantId) {
        let c = imported.constants.get(id).clone();
        let name = self.remap_string(imported, strings, c.name);
        self.constants.alloc(Constant {
            owner: map_owner(o, c.owner),
            location: map_location(o, c.location),
            name,
            flags: c.flags | MemberFlags::IMPORT,
            type_decl: map_type_decl(o, c.type_decl),
            value: map_constant_value(o, c.value),
        });
    }

    fn remap_opcode(&mut self, imported: &StubLibrary, o: &Offsets, strings: &mut FxHashMap<StringId, StringId>, op: &Opcode) -> Opcode {
        match *op {
            Opcode::Nop => Opcode::Nop,
            Opcode::Label(l) => Opcode::Label(l),
            Opcode::Jump(l) => Opcode::Jump(l),
            Opcode::JumpIfFalse(l) => Opcode::JumpIfFalse(l),
            Opcode::Exit => Opcode::Exit,
            Opcode::Breakpoint => Opcode::Breakpoint,
            Opcode::LocalCtor { var_index, type_decl } => Opcode::LocalCtor { var_index, type_decl: map_type_decl(o, type_decl) },
            Opcode::LocalDtor { var_index, type_decl } => Opcode::LocalDtor { var_index, type_decl: map_type_decl(o, type_decl) },
            Opcode::ParamVar(i) => Opcode::ParamVar(i),
            Opcode::LocalVar { var_index, type_decl } => Opcode::LocalVar { var_index, type_decl: map_type_decl(o, type_decl) },
            Opcode::ContextVar(p) => Opcode::ContextVar(map_property(o, p)),
            Opcode::ContextFromPtr { label, return_type } => Opcode::ContextFromPtr { label, return_type: map_type_decl(o, return_type) },
            Opcode::ContextFromPtrRef { label, return_type } => Opcode::ContextFromPtrRef { label, return_type: map_type_decl(o, return_type) },
            Opcode::ContextFromRef { label, return_type } => Opcode::ContextFromRef { label, return_type: map_type_decl(o, return_type) },
            Opcode::ContextFromValue { label, return_type } => Opcode::ContextFromValue { label, return_type: map_type_decl(o, return_type) },
            Opcode::ContextCtor(p) => Opcode::ContextCtor(map_property(o, p)),
            Opcode::ContextDtor(p) => Opcode::ContextDtor(map_property(o, p)),
            Opcode::ThisStruct => Opcode::ThisStruct,
            Opcode::ThisObject => Opcode::ThisObject,
            Opcode::StructMember(p) => Opcode::StructMember(map_property(o, p)),
            Opcode::StructMemberRef(p) => Opcode::StructMemberRef(map_property(o, p)),
            Opcode::StaticFunc { function, encoding } => Opcode::StaticFunc { function: map_function(o, function), encoding },
            Opcode::VirtualFunc { function, encoding } => Opcode::VirtualFunc { function: map_function(o, function), encoding },
            Opcode::FinalFunc { function, encoding } => Opcode::FinalFunc { function: map_function(o, function), encoding },
            Opcode::IntConst1(v) => Opcode::IntConst1(v),
            Opcode::IntConst2(v) => Opcode::IntConst2(v),
            Opcode::IntConst4(v) => Opcode::IntConst4(v),
            Opcode::IntConst8(v) => Opcode::IntConst8(v),
            Opcode::UintConst1(v) => Opcode::UintConst1(v),
            Opcode::UintConst2(v) => Opcode::UintConst2(v),
            Opcode::UintConst4(v) => Opcode::UintConst4(v),
            Opcode::UintConst8(v) => Opcode::UintConst8(v),
            Opcode::IntZero => Opcode::IntZero,
            Opcode::IntOne => Opcode::IntOne,
            Opcode::FloatConst(v) => Opcode::FloatConst(v),
            Opcode::DoubleConst(v) => Opcode::DoubleConst(v),
            Opcode::BoolTrue => Opcode::BoolTrue,
            Opcode::BoolFalse => Opcode::BoolFalse,
            Opcode::StringConst(s) => Opcode::StringConst(self.remap_string(imported, strings, s)),
            Opcode::StringIndexConst(s) => Opcode::StringIndexConst(self.remap_string(imported, strings, s)),
            Opcode::NameConst(s) => Opcode::NameConst(self.remap_string(imported, strings, s)),
            Opcode::EnumConst { enum_ref, name } => Opcode::EnumConst { enum_ref: map_enum(o, enum_ref), name: self.remap_string(imported, strings, name) },
            Opcode::ClassConst(c) => Opcode::ClassConst(map_class(o, c)),
            Opcode::Null => Opcode::Null,
            Opcode::New(c) => Opcode::New(map_class(o, c)),
            Opcode::Constructor { type_decl, argc } => Opcode::Constructor { type_decl: map_type_decl(o, type_decl), argc },
            Opcode::LoadInt1 => Opcode::LoadInt1,
            Opcode::LoadInt2 => Opcode::LoadInt2,
            Opcode::LoadInt4 => Opcode::LoadInt4,
            Opcode::LoadInt8 => Opcode::LoadInt8,
            Opcode::LoadUint1 => Opcode::LoadUint1,
            Opcode::LoadUint2 => Opcode::LoadUint2,
            Opcode::LoadUint4 => Opcode::LoadUint4,
            Opcode::LoadUint8 => Opcode::LoadUint8,
            Opcode::LoadFloat => Opcode::LoadFloat,
            Opcode::LoadDouble => Opcode::LoadDouble,
            Opcode::LoadStrongPtr => Opcode::LoadStrongPtr,
            Opcode::LoadWeakPtr => Opcode::LoadWeakPtr,
            Opcode::LoadAny(t) => Opcode::LoadAny(map_type_decl(o, t)),
            Opcode::AssignInt1 => Opcode::AssignInt1,
            Opcode::AssignInt2 => Opcode::AssignInt2,
            Opcode::AssignInt4 => Opcode::AssignInt4,
            Opcode::AssignInt8 => Opcode::AssignInt8,
            Opcode::AssignUint1 => Opcode::AssignUint1,
            Opcode::AssignUint2 => Opcode::AssignUint2,
            Opcode::AssignUint4 => Opcode::AssignUint4,
            Opcode::AssignUint8 => Opcode::AssignUint8,
            Opcode::AssignFloat => Opcode::AssignFloat,
            Opcode::AssignDouble => Opcode::AssignDouble,
            Opcode::AssignAny(t) => Opcode::AssignAny(map_type_decl(o, t)),
            Opcode::TestEqual(t) => Opcode::TestEqual(map_type_decl(o, t)),
            Opcode::TestNotEqual(t) => Opcode::TestNotEqual(map_type_decl(o, t)),
            Opcode::WeakToStrong => Opcode::WeakToStrong,
            Opcode::StrongToWeak => Opcode::StrongToWeak,
            Opcode::DynamicCast(c) => Opcode::DynamicCast(map_class(o, c)),
            Opcode::DynamicWeakCast(c) => Opcode::DynamicWeakCast(map_class(o, c)),
            Opcode::MetaCast(c) => Opcode::MetaCast(map_class(o, c)),
            Opcode::EnumToInt64 => Opcode::EnumToInt64,
            Opcode::EnumToInt32 => Opcode::EnumToInt32,
            Opcode::Int64ToEnum => Opcode::Int64ToEnum,
            Opcode::Int32ToEnum => Opcode::Int32ToEnum,
            Opcode::EnumToName => Opcode::EnumToName,
            Opcode::NameToEnum => Opcode::NameToEnum,
            Opcode::EnumToString => Opcode::EnumToString,
            Opcode::StrongToBool => Opcode::StrongToBool,
            Opcode::WeakToBool => Opcode::WeakToBool,
            Opcode::ClassToBool => Opcode::ClassToBool,
            Opcode::ClassToName => Opcode::ClassToName,
            Opcode::ClassToString => Opcode::ClassToString,
            Opcode::CastToVariant(t) => Opcode::CastToVariant(map_type_decl(o, t)),
            Opcode::CastFromVariant(t) => Opcode::CastFromVariant(map_type_decl(o, t)),
            Opcode::LogicOr(l) => Opcode::LogicOr(l),
            Opcode::LogicAnd(l) => Opcode::LogicAnd(l),
            Opcode::ReturnDirect(t) => Opcode::ReturnDirect(map_type_decl(o, t)),
            Opcode::ReturnLoad1(t) => Opcode::ReturnLoad1(map_type_decl(o, t)),
            Opcode::ReturnLoad2(t) => Opcode::ReturnLoad2(map_type_decl(o, t)),
            Opcode::ReturnLoad4(t) => Opcode::ReturnLoad4(map_type_decl(o, t)),
            Opcode::ReturnLoad8(t) => Opcode::ReturnLoad8(map_type_decl(o, t)),
            Opcode::ReturnAny(t) => Opcode::ReturnAny(map_type_decl(o, t)),
            Opcode::DebugLine(l) => Opcode::DebugLine(l),
        }
    }
}
