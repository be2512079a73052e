use {
    crate::{HasModuleCodec, ModuleCodec},
    indexer_appdata::AppDataResult,
    std::{collections::BTreeMap, sync::Arc},
};

/// Finds the codec of a module.
pub trait DecoderResolver: Send + Sync {
    /// Visit every module codec known upfront, in module name order. Stops at
    /// the first error.
    fn all_decoders(
        &self,
        visit: &mut dyn FnMut(&str, &ModuleCodec) -> AppDataResult<()>,
    ) -> AppDataResult<()>;

    /// `Ok(None)` if the module is unknown.
    fn lookup_decoder(&self, module_name: &str) -> AppDataResult<Option<ModuleCodec>>;
}

/// Resolves codecs from a fixed set of modules, asking the module for its
/// codec on every lookup.
#[derive(Default)]
pub struct ModuleSetDecoderResolver {
    modules: BTreeMap<String, Arc<dyn HasModuleCodec>>,
}

impl ModuleSetDecoderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module<N, M>(mut self, name: N, module: M) -> Self
    where
        N: Into<String>,
        M: HasModuleCodec + 'static,
    {
        self.modules.insert(name.into(), Arc::new(module));
        self
    }
}

impl DecoderResolver for ModuleSetDecoderResolver {
    fn all_decoders(
        &self,
        visit: &mut dyn FnMut(&str, &ModuleCodec) -> AppDataResult<()>,
    ) -> AppDataResult<()> {
        for (name, module) in &self.modules {
            visit(name, &module.module_codec()?)?;
        }

        Ok(())
    }

    fn lookup_decoder(&self, module_name: &str) -> AppDataResult<Option<ModuleCodec>> {
        self.modules
            .get(module_name)
            .map(|module| module.module_codec())
            .transpose()
    }
}

/// Resolves codecs from a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticDecoderResolver {
    codecs: BTreeMap<String, ModuleCodec>,
}

impl StaticDecoderResolver {
    pub fn new<I, N>(codecs: I) -> Self
    where
        I: IntoIterator<Item = (N, ModuleCodec)>,
        N: Into<String>,
    {
        Self {
            codecs: codecs
                .into_iter()
                .map(|(name, codec)| (name.into(), codec))
                .collect(),
        }
    }
}

impl DecoderResolver for StaticDecoderResolver {
    fn all_decoders(
        &self,
        visit: &mut dyn FnMut(&str, &ModuleCodec) -> AppDataResult<()>,
    ) -> AppDataResult<()> {
        self.codecs
            .iter()
            .try_for_each(|(name, codec)| visit(name, codec))
    }

    fn lookup_decoder(&self, module_name: &str) -> AppDataResult<Option<ModuleCodec>> {
        Ok(self.codecs.get(module_name).cloned())
    }
}

/// Resolves codecs on demand through a lookup function. Knows no modules
/// upfront, so [`DecoderResolver::all_decoders`] visits nothing.
pub struct DynamicDecoderResolver {
    lookup: Box<dyn Fn(&str) -> AppDataResult<Option<ModuleCodec>> + Send + Sync>,
}

impl DynamicDecoderResolver {
    pub fn new<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> AppDataResult<Option<ModuleCodec>> + Send + Sync + 'static,
    {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl DecoderResolver for DynamicDecoderResolver {
    fn all_decoders(
        &self,
        _visit: &mut dyn FnMut(&str, &ModuleCodec) -> AppDataResult<()>,
    ) -> AppDataResult<()> {
        Ok(())
    }

    fn lookup_decoder(&self, module_name: &str) -> AppDataResult<Option<ModuleCodec>> {
        (self.lookup)(module_name)
    }
}

// ----------------------------------- tests -----------------------------------
