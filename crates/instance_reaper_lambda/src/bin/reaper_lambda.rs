use std::time::Duration;

use aws_sdk_ec2::operation::describe_instances::DescribeInstancesOutput;
use aws_sdk_ec2::types::Filter;
use instance_reaper_core::contract::{
    InstanceObservation, ResponseEnvelope, DEFAULT_TAG_KEY, DEFAULT_WAIT_SECS,
};
use instance_reaper_lambda::adapters::ec2::InstanceApi;
use instance_reaper_lambda::adapters::waiter::ThreadWaiter;
use instance_reaper_lambda::handlers::reaper::{handle_reap_event, ReaperConfig};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct Ec2InstanceApi {
    ec2_client: aws_sdk_ec2::Client,
}

fn flatten_reservations(output: DescribeInstancesOutput) -> Vec<InstanceObservation> {
    output
        .reservations()
        .iter()
        .flat_map(|reservation| reservation.instances())
        .filter_map(|instance| {
            let instance_id = instance.instance_id()?.to_string();
            let state = instance
                .state()
                .and_then(|state| state.name())
                .map(|name| name.as_str().to_string())?;
            Some(InstanceObservation { instance_id, state })
        })
        .collect()
}

impl InstanceApi for Ec2InstanceApi {
    fn describe_by_tags(
        &self,
        tag_key: &str,
        tag_values: Option<&[String]>,
    ) -> Result<Vec<InstanceObservation>, String> {
        let client = self.ec2_client.clone();
        let filter = tag_values.map(|values| {
            Filter::builder()
                .name(format!("tag:{tag_key}"))
                .set_values(Some(values.to_vec()))
                .build()
        });

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut request = client.describe_instances();
                if let Some(filter) = filter {
                    request = request.filters(filter);
                }

                request
                    .send()
                    .await
                    .map(flatten_reservations)
                    .map_err(|error| format!("failed to describe instances: {error}"))
            })
        })
    }

    fn describe_by_ids(&self, ids: &[String]) -> Result<Vec<InstanceObservation>, String> {
        let client = self.ec2_client.clone();
        let instance_ids = ids.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .describe_instances()
                    .set_instance_ids(Some(instance_ids))
                    .send()
                    .await
                    .map(flatten_reservations)
                    .map_err(|error| format!("failed to describe instances by id: {error}"))
            })
        })
    }

    fn stop_instances(&self, ids: &[String]) -> Result<Vec<String>, String> {
        let client = self.ec2_client.clone();
        let instance_ids = ids.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .stop_instances()
                    .set_instance_ids(Some(instance_ids))
                    .send()
                    .await
                    .map(|output| {
                        output
                            .stopping_instances()
                            .iter()
                            .filter_map(|change| change.instance_id().map(str::to_string))
                            .collect()
                    })
                    .map_err(|error| format!("failed to stop instances: {error}"))
            })
        })
    }

    fn terminate_instances(&self, ids: &[String]) -> Result<Vec<String>, String> {
        let client = self.ec2_client.clone();
        let instance_ids = ids.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .terminate_instances()
                    .set_instance_ids(Some(instance_ids))
                    .send()
                    .await
                    .map(|output| {
                        output
                            .terminating_instances()
                            .iter()
                            .filter_map(|change| change.instance_id().map(str::to_string))
                            .collect()
                    })
                    .map_err(|error| format!("failed to terminate instances: {error}"))
            })
        })
    }
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<ResponseEnvelope, Error> {
    let tag_key =
        std::env::var("REAPER_TAG_KEY").unwrap_or_else(|_| DEFAULT_TAG_KEY.to_string());
    let wait_secs = std::env::var("REAPER_WAIT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(DEFAULT_WAIT_SECS);
    let config = ReaperConfig {
        tag_key,
        wait: Duration::from_secs(wait_secs),
    };

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let api = Ec2InstanceApi {
        ec2_client: aws_sdk_ec2::Client::new(&aws_config),
    };

    Ok(handle_reap_event(&event.payload, &config, &api, &ThreadWaiter))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::run(service_fn(handle_request)).await
}
