//! Drives a listener with generated blocks while keeping the expected state.

use {
    crate::{
        schemagen::state_object_update_for_collection,
        statesim::{self, StateSimOptions},
    },
    indexer_appdata::{
        bail, AppDataError, AppDataResult, CommitData, Listener, ModuleInitializationData,
        ObjectUpdateData, Packet, StartBlockData,
    },
    indexer_schema::{
        object_key_string,
        view::{ModuleState, ObjectCollection},
        ModuleSchema, StateObjectType, StateObjectUpdate,
    },
    proptest::{
        prelude::*,
        strategy::{Union, ValueTree},
        test_runner::TestRunner,
    },
    std::{
        collections::{BTreeMap, BTreeSet},
        sync::Arc,
    },
};

/// The packets of one block: a start, object updates, and a commit.
pub type BlockData = Vec<Packet>;

#[derive(Debug, Clone, Default)]
pub struct SimulatorOptions {
    pub app_schema: BTreeMap<String, Arc<ModuleSchema>>,
    pub listener: Listener,
    pub state_sim_options: StateSimOptions,
}

/// Generates blocks that are valid against the current state, applies them
/// to a [`statesim::App`] and forwards them to a listener.
#[derive(Debug)]
pub struct Simulator {
    state: statesim::App,
    listener: Listener,
    block_height: u64,
}

impl Simulator {
    /// Initialize every module of the app schema, on both the simulated
    /// state and the listener.
    pub fn new(options: SimulatorOptions) -> AppDataResult<Self> {
        let mut state = statesim::App::new(options.state_sim_options);

        for (module_name, schema) in options.app_schema {
            let data = ModuleInitializationData {
                module_name,
                schema,
            };

            state.initialize_module(&data)?;
            options.listener.send_packet(data)?;
        }

        Ok(Self {
            state,
            listener: options.listener,
            block_height: 0,
        })
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn state(&self) -> &statesim::App {
        &self.state
    }

    /// A strategy for the next block, with between one and
    /// `max_updates_per_block` object updates. No two updates in a block
    /// touch the same object.
    pub fn block_data_gen(&self, max_updates_per_block: usize) -> BoxedStrategy<BlockData> {
        let height = self.block_height + 1;

        let mut object_types = BTreeMap::new();
        let mut updates = vec![];

        for module in self.state.modules() {
            let module_name = module.module_name().to_string();

            for collection in module.collections() {
                let object_type = collection.object_type().clone();
                let key = (module_name.clone(), object_type.name.clone());

                updates.push(
                    (Just(module_name.clone()), state_object_update_for_collection(collection))
                        .boxed(),
                );
                object_types.insert(key, object_type);
            }
        }

        if updates.is_empty() {
            return Just(vec![
                StartBlockData::new(height).into(),
                CommitData.into(),
            ])
            .boxed();
        }

        prop::collection::vec(Union::new(updates), 1..=max_updates_per_block.max(1))
            .prop_map(move |updates| block_data(height, &object_types, updates))
            .boxed()
    }

    /// Draw the next block from `runner`.
    pub fn next_block(
        &self,
        runner: &mut TestRunner,
        max_updates_per_block: usize,
    ) -> AppDataResult<BlockData> {
        self.block_data_gen(max_updates_per_block)
            .new_tree(runner)
            .map(|tree| tree.current())
            .map_err(|reason| AppDataError::Generic(reason.to_string()))
    }

    /// Apply `block` to the simulated state and forward its packets to the
    /// listener, in order.
    pub fn process_block_data(&mut self, block: &BlockData) -> AppDataResult<()> {
        let height = match block.first() {
            Some(Packet::StartBlock(data)) => data.height,
            _ => bail!("block must begin with a start block packet"),
        };

        if height != self.block_height + 1 {
            bail!(
                "expected block {}, got block {height}",
                self.block_height + 1
            );
        }

        if !matches!(block.last(), Some(Packet::Commit(_))) {
            bail!("block {height} must end with a commit packet");
        }

        for packet in block {
            match packet {
                Packet::ModuleInitialization(data) => self.state.initialize_module(data)?,
                Packet::ObjectUpdate(data) => self.state.apply_update(data)?,
                _ => {},
            }

            self.listener.send_packet(packet.clone())?;
        }

        self.block_height = height;

        Ok(())
    }
}

fn block_data(
    height: u64,
    object_types: &BTreeMap<(String, String), StateObjectType>,
    updates: Vec<(String, StateObjectUpdate)>,
) -> BlockData {
    let mut seen = BTreeSet::new();
    let mut packets = vec![StartBlockData::new(height).into()];

    for (module_name, update) in updates {
        let Some(object_type) = object_types.get(&(module_name.clone(), update.type_name.clone()))
        else {
            continue;
        };

        let Ok(key) = object_key_string(object_type, &update.key) else {
            continue;
        };

        if seen.insert((module_name.clone(), update.type_name.clone(), key)) {
            packets.push(
                ObjectUpdateData {
                    module_name,
                    updates: vec![update],
                }
                .into(),
            );
        }
    }

    packets.push(CommitData.into());
    packets
}

// ----------------------------------- tests -----------------------------------
